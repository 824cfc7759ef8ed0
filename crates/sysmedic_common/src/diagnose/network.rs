//! Network problem diagnosis.

use super::Diagnosis;
use crate::checks::network_interfaces;
use crate::fixes::{common_fix, Fix, RiskLevel};
use crate::probe::{probe, probe_ok};

pub fn diagnose_network_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Network Issues");

    if probe("systemctl", &["is-active", "networking"])
        .map(|s| s.trim() == "active")
        .unwrap_or(false)
    {
        diagnosis.finding("Networking service is active");
    } else {
        diagnosis.finding("Networking service is not running");
        if let Some(fix) = common_fix("restart_networking") {
            diagnosis.fix(fix);
        }
    }

    if let Some(interfaces) = network_interfaces() {
        let down: Vec<String> = interfaces
            .iter()
            .filter(|i| !i.loopback && !i.up)
            .map(|i| i.name.clone())
            .collect();

        if down.is_empty() {
            diagnosis.finding("All network interfaces are up");
        } else {
            diagnosis.finding(format!("Interfaces down: {}", down.join(", ")));
            for iface in &down {
                diagnosis.fix(
                    Fix::new(
                        format!("bring_up_{}", iface),
                        format!("Bring Up Interface {}", iface),
                        format!("Bring up interface {}", iface),
                        vec![format!("ip link set {} up", iface)],
                        true,
                        RiskLevel::Medium,
                    )
                    .reversible(vec![format!("ip link set {} down", iface)]),
                );
            }
        }
    }

    // One ICMP packet to a well-known resolver stands in for "do we have
    // connectivity and working resolution".
    if probe_ok("ping", &["-c", "1", "-W", "2", "debian.org"]) {
        diagnosis.finding("DNS resolution working");
    } else {
        diagnosis.finding("DNS resolution failed");
        if let Some(fix) = common_fix("flush_dns") {
            diagnosis.fix(fix);
        }
    }

    if let Some(routes) = probe("ip", &["route", "show", "default"]) {
        if routes.trim().is_empty() {
            diagnosis.finding("No default route configured");
            diagnosis.fix(
                Fix::new(
                    "add_default_route",
                    "Add Default Route",
                    "Add default route (replace IP with your gateway)",
                    vec!["ip route add default via 192.168.1.1".to_string()],
                    true,
                    RiskLevel::High,
                )
                .reversible(vec!["ip route del default via 192.168.1.1".to_string()]),
            );
        } else {
            diagnosis.finding("Default route configured");
        }
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No network issues detected");
    }

    diagnosis.fix(Fix::new(
        "network_overview",
        "Network Overview",
        "Display addresses, routes, resolver configuration and connectivity",
        vec![
            "ip addr show".to_string(),
            "ip route show".to_string(),
            "cat /etc/resolv.conf".to_string(),
            "ping -c 3 8.8.8.8".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}
