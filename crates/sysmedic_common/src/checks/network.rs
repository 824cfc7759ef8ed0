//! Network interface and DNS configuration check.

use super::{Check, Finding, Severity};
use crate::probe::probe;

pub struct NetworkCheck;

impl Check for NetworkCheck {
    fn name(&self) -> &'static str {
        "Network Configuration"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());

        let Some(interfaces) = list_interfaces() else {
            finding.escalate(Severity::Error, "Failed to check network interfaces");
            return finding;
        };

        let mut has_active_interface = false;
        for iface in &interfaces {
            if iface.loopback {
                continue;
            }
            if iface.up {
                has_active_interface = true;
                finding.detail(format!("Interface {} is UP", iface.name));
                let addrs = interface_addresses(&iface.name);
                if addrs.is_empty() {
                    finding.detail(format!("  No IP address assigned to {}", iface.name));
                } else {
                    for addr in addrs {
                        finding.detail(format!("  IP: {}", addr));
                    }
                }
            } else {
                finding.detail(format!("Interface {} is DOWN", iface.name));
            }
        }

        match dns_servers() {
            Some(servers) if !servers.is_empty() => {
                finding.detail(format!("DNS servers: {}", servers.join(", ")));
            }
            _ => {
                finding.detail("No DNS servers configured".to_string());
                finding.escalate(Severity::Warning, "No DNS servers configured");
            }
        }

        if !has_active_interface {
            finding.escalate(Severity::Error, "No active network interfaces found");
        } else {
            finding.escalate(finding.severity, "Network configuration OK");
        }

        finding
    }
}

pub(crate) struct Interface {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
}

/// Interfaces with link state, parsed from `ip -o link`.
pub(crate) fn list_interfaces() -> Option<Vec<Interface>> {
    let output = probe("ip", &["-o", "link", "show"])?;
    Some(output.lines().filter_map(parse_link_line).collect())
}

fn parse_link_line(line: &str) -> Option<Interface> {
    // "2: enp3s0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 ..."
    let mut fields = line.split_whitespace();
    let name = fields.nth(1)?.trim_end_matches(':');
    let flags = fields.next()?.trim_matches(|c| c == '<' || c == '>');
    let flag_set: Vec<&str> = flags.split(',').collect();
    Some(Interface {
        name: name.split('@').next().unwrap_or(name).to_string(),
        up: flag_set.contains(&"UP"),
        loopback: flag_set.contains(&"LOOPBACK"),
    })
}

fn interface_addresses(name: &str) -> Vec<String> {
    let Some(output) = probe("ip", &["-o", "-4", "addr", "show", "dev", name]) else {
        return Vec::new();
    };
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            fields.position(|f| f == "inet")?;
            fields.next().map(|a| a.to_string())
        })
        .collect()
}

fn dns_servers() -> Option<Vec<String>> {
    let raw = std::fs::read_to_string("/etc/resolv.conf").ok()?;
    Some(
        raw.lines()
            .filter(|line| line.starts_with("nameserver"))
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(|s| s.to_string())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_link_line_extracts_state() {
        let iface =
            parse_link_line("2: enp3s0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500").unwrap();
        assert_eq!(iface.name, "enp3s0");
        assert!(iface.up);
        assert!(!iface.loopback);
    }

    #[test]
    fn parse_link_line_detects_loopback_and_down() {
        let lo = parse_link_line("1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536").unwrap();
        assert!(lo.loopback);

        let down = parse_link_line("3: wlan0: <BROADCAST,MULTICAST> mtu 1500").unwrap();
        assert!(!down.up);
    }

    #[test]
    fn parse_link_line_strips_vlan_suffix() {
        let iface = parse_link_line("4: eth0.10@eth0: <BROADCAST,UP> mtu 1500").unwrap();
        assert_eq!(iface.name, "eth0.10");
    }

    #[test]
    fn parse_link_line_rejects_garbage() {
        assert!(parse_link_line("").is_none());
        assert!(parse_link_line("nonsense").is_none());
    }
}
