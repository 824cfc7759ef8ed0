//! Service problem diagnosis.

use super::Diagnosis;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::{probe, probe_lenient};
use regex::Regex;

/// Services that should normally be enabled on a Debian host.
const CRITICAL_SERVICES: &[&str] = &[
    "networking",
    "systemd-networkd",
    "NetworkManager",
    "ssh",
    "sshd",
    "systemd-logind",
    "dbus",
    "systemd-resolved",
    "systemd-timesyncd",
];

pub fn diagnose_service_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Service Issues");

    let failed = failed_service_units();
    if !failed.is_empty() {
        diagnosis.finding("Failed services detected:");
        for service in &failed {
            diagnosis.finding(format!("  - {}", service));
        }

        diagnosis.fix(
            Fix::new(
                "restart_failed_services",
                "Restart Failed Services",
                "Attempt to restart all failed services",
                vec![format!("systemctl restart {}", failed.join(" "))],
                true,
                RiskLevel::Medium,
            )
            .reversible(vec![format!("systemctl stop {}", failed.join(" "))]),
        );

        diagnosis.fix(Fix::new(
            "check_service_logs",
            "Check Service Logs",
            "Examine logs for failed services to understand issues",
            failed
                .iter()
                .map(|s| format!("journalctl -u {} -n 50 --no-pager", s))
                .collect(),
            false,
            RiskLevel::Low,
        ));
    }

    let stuck = stuck_service_units();
    if !stuck.is_empty() {
        diagnosis.finding("Services stuck activating or deactivating:");
        for service in &stuck {
            diagnosis.finding(format!("  - {}", service));
        }

        diagnosis.fix(Fix::new(
            "reset_error_services",
            "Reset Services in Error State",
            "Reset failed service states and attempt restart",
            vec![
                "systemctl reset-failed".to_string(),
                format!("systemctl restart {}", stuck.join(" ")),
            ],
            true,
            RiskLevel::Medium,
        ));
    }

    let disabled = disabled_critical_services();
    if !disabled.is_empty() {
        diagnosis.finding("Critical services that are disabled:");
        for service in &disabled {
            diagnosis.finding(format!("  - {}", service));
        }

        let mut enable = Vec::new();
        let mut disable = Vec::new();
        for service in &disabled {
            enable.push(format!("systemctl enable {}", service));
            enable.push(format!("systemctl start {}", service));
            disable.push(format!("systemctl disable {}", service));
            disable.push(format!("systemctl stop {}", service));
        }
        diagnosis.fix(
            Fix::new(
                "enable_critical_services",
                "Enable Critical Services",
                "Enable and start essential system services",
                enable,
                true,
                RiskLevel::High,
            )
            .reversible(disable),
        );
    }

    let flapping = flapping_services();
    if !flapping.is_empty() {
        diagnosis.finding("Services with high restart rates (potentially flapping):");
        for service in &flapping {
            diagnosis.finding(format!("  - {}", service));
        }

        diagnosis.fix(Fix::new(
            "analyze_flapping_services",
            "Analyze Flapping Services",
            "Examine services that are restarting frequently",
            flapping
                .iter()
                .map(|s| format!("systemctl status {}", s))
                .collect(),
            false,
            RiskLevel::Low,
        ));

        diagnosis.fix(
            Fix::new(
                "stop_flapping_services",
                "Stop Flapping Services",
                "Temporarily stop services that are restarting frequently",
                vec![format!("systemctl stop {}", flapping.join(" "))],
                true,
                RiskLevel::High,
            )
            .reversible(vec![format!("systemctl start {}", flapping.join(" "))]),
        );
    }

    let masked = masked_services();
    if !masked.is_empty() {
        diagnosis.finding("Masked services that may need attention:");
        for service in &masked {
            diagnosis.finding(format!("  - {}", service));
        }

        diagnosis.fix(
            Fix::new(
                "unmask_services",
                "Unmask Services",
                "Unmask services that may have been accidentally masked",
                vec![format!("systemctl unmask {}", masked.join(" "))],
                true,
                RiskLevel::Medium,
            )
            .reversible(vec![format!("systemctl mask {}", masked.join(" "))]),
        );
    }

    if unit_dependency_problems() {
        diagnosis.finding("Unit file verification reported dependency problems");
        diagnosis.fix(Fix::new(
            "reload_systemd_daemon",
            "Reload Systemd Configuration",
            "Reload systemd daemon to refresh service dependencies",
            vec!["systemctl daemon-reload".to_string()],
            true,
            RiskLevel::Medium,
        ));
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No significant service issues detected");
    }

    diagnosis.fix(Fix::new(
        "services_overview",
        "Service Overview",
        "Display comprehensive service status information",
        vec![
            "systemctl list-units --type=service --state=failed".to_string(),
            "systemctl list-units --type=service --state=active".to_string(),
            "systemctl is-system-running".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

fn service_names(output: &str) -> Vec<String> {
    // Unit listings may prefix each line with a state bullet; the unit
    // name is the first token carrying the .service suffix.
    output
        .lines()
        .filter_map(|line| {
            line.split_whitespace()
                .find(|token| token.ends_with(".service"))
        })
        .map(|unit| unit.trim_end_matches(".service").to_string())
        .collect()
}

fn failed_service_units() -> Vec<String> {
    probe(
        "systemctl",
        &["list-units", "--failed", "--type=service", "--no-legend"],
    )
    .map(|o| service_names(&o))
    .unwrap_or_default()
}

fn stuck_service_units() -> Vec<String> {
    probe(
        "systemctl",
        &[
            "list-units",
            "--type=service",
            "--state=activating,deactivating",
            "--no-legend",
        ],
    )
    .map(|o| service_names(&o))
    .unwrap_or_default()
}

fn disabled_critical_services() -> Vec<String> {
    CRITICAL_SERVICES
        .iter()
        .filter(|service| {
            probe("systemctl", &["is-enabled", service])
                .map(|s| s.trim() == "disabled")
                .unwrap_or(false)
        })
        .map(|s| s.to_string())
        .collect()
}

/// Services with more than six start/stop events in the last hour.
fn flapping_services() -> Vec<String> {
    let Some(output) = probe(
        "journalctl",
        &["--since", "1 hour ago", "--no-pager", "-o", "short"],
    ) else {
        return Vec::new();
    };

    let Ok(re) = Regex::new(r"(Started|Stopped) (.+)\.service") else {
        return Vec::new();
    };

    let mut events: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for line in output.lines() {
        if let Some(captures) = re.captures(line) {
            *events.entry(captures[2].to_string()).or_default() += 1;
        }
    }

    let mut flapping: Vec<String> = events
        .into_iter()
        .filter(|(_, count)| *count > 6)
        .map(|(service, _)| service)
        .collect();
    flapping.sort();
    flapping
}

fn masked_services() -> Vec<String> {
    probe(
        "systemctl",
        &[
            "list-unit-files",
            "--type=service",
            "--state=masked",
            "--no-legend",
        ],
    )
    .map(|o| service_names(&o))
    .unwrap_or_default()
}

fn unit_dependency_problems() -> bool {
    probe_lenient("systemd-analyze", &["verify"])
        .map(|output| {
            let lower = output.to_lowercase();
            lower.contains("circular") || lower.contains("ordering cycle")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn service_names_parses_unit_listing() {
        let output = "nginx.service loaded failed failed  A high performance web server\n\
                      * postgresql.service loaded failed failed PostgreSQL RDBMS\n\
                      some.timer loaded active waiting Timer\n";
        let names = service_names(output);
        assert_eq!(names, ["nginx", "postgresql"]);
    }

    #[test]
    fn service_names_handles_empty_output() {
        assert!(service_names("").is_empty());
    }

    #[test]
    fn services_diagnosis_ends_with_overview() {
        let diagnosis = diagnose_service_issues();
        assert_eq!(diagnosis.fixes.last().unwrap().id, "services_overview");
    }

    #[test]
    fn services_fix_ids_are_distinct() {
        let diagnosis = diagnose_service_issues();
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }
}
