//! Boot problem diagnosis.

use super::Diagnosis;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::probe;

pub fn diagnose_boot_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Boot Issues");

    if let Some(output) = probe("systemctl", &["is-system-running"]) {
        let state = output.trim();
        match state {
            "degraded" => {
                diagnosis.finding("System is in degraded state");
                diagnosis.fix(Fix::new(
                    "show_failed_services",
                    "Show Failed Services",
                    "Display services that failed to start during boot",
                    vec!["systemctl --failed".to_string()],
                    false,
                    RiskLevel::Low,
                ));
            }
            "running" => diagnosis.finding("System is running normally"),
            other => diagnosis.finding(format!("System state: {}", other)),
        }
    }

    if let Some(output) = probe(
        "journalctl",
        &["-b", "--no-pager", "-p", "err", "-n", "10"],
    ) {
        let error_count = output.lines().filter(|l| !l.trim().is_empty()).count();
        if error_count > 0 {
            diagnosis.finding("Boot errors detected in system journal");
            diagnosis.fix(Fix::new(
                "view_boot_errors",
                "View Boot Errors",
                "Display boot-time errors from the system journal",
                vec!["journalctl -b -p err".to_string()],
                false,
                RiskLevel::Low,
            ));
        }
    }

    if let Ok(mounts) = std::fs::read_to_string("/proc/mounts") {
        let root_read_only = mounts.lines().any(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next().unwrap_or_default();
            let mount_point = fields.next().unwrap_or_default();
            let options = fields.nth(1).unwrap_or_default();
            device.starts_with("/dev/")
                && mount_point == "/"
                && options.split(',').any(|o| o == "ro")
        });
        if root_read_only {
            diagnosis.finding("Read-only root filesystem detected");
            diagnosis.fix(
                Fix::new(
                    "remount_rw",
                    "Remount Filesystem Read-Write",
                    "Remount the root filesystem as read-write to allow modifications",
                    vec!["mount -o remount,rw /".to_string()],
                    true,
                    RiskLevel::Medium,
                )
                .reversible(vec!["mount -o remount,ro /".to_string()]),
            );
        }
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No boot issues detected");
    }

    diagnosis.fix(Fix::new(
        "boot_overview",
        "Boot Overview",
        "Examine boot state, boot-time journal and block devices",
        vec![
            "systemctl is-system-running".to_string(),
            "systemd-analyze".to_string(),
            "journalctl -b -p warning -n 20".to_string(),
            "lsblk".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_diagnosis_always_offers_overview() {
        let diagnosis = diagnose_boot_issues();
        assert_eq!(diagnosis.issue, "Boot Issues");
        assert_eq!(diagnosis.fixes.last().unwrap().id, "boot_overview");
        assert!(!diagnosis.findings.is_empty());
    }
}
