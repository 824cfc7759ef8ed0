//! Disk problem diagnosis.

use super::Diagnosis;
use crate::fixes::{common_fix, Fix, RiskLevel};
use crate::probe::probe;
use sysinfo::Disks;

const WATCHED_MOUNTS: &[(&str, &str)] = &[
    ("/", "Root"),
    ("/home", "Home"),
    ("/var", "Var"),
    ("/tmp", "Tmp"),
];

pub fn diagnose_disk_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Disk Issues");

    let disks = Disks::new_with_refreshed_list();
    for (path, name) in WATCHED_MOUNTS {
        let Some(disk) = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new(path))
        else {
            continue;
        };
        let total = disk.total_space();
        if total == 0 {
            continue;
        }
        let used = total.saturating_sub(disk.available_space());
        let usage_percent = used * 100 / total;

        if usage_percent > 95 {
            diagnosis.finding(format!(
                "{} filesystem critical: {}% full",
                name, usage_percent
            ));
        } else if usage_percent > 85 {
            diagnosis.finding(format!(
                "{} filesystem warning: {}% full",
                name, usage_percent
            ));
        }
    }

    // Cleanup candidates are always offered; disk maintenance is useful
    // even before a filesystem hits the thresholds above.
    if let Some(fix) = common_fix("clean_package_cache") {
        diagnosis.fix(fix);
    }
    if let Some(fix) = common_fix("remove_orphaned_packages") {
        diagnosis.fix(fix);
    }

    diagnosis.fix(Fix::new(
        "find_large_files",
        "Find Large Files",
        "Find files larger than 100MB to identify disk space usage",
        vec!["find / -xdev -type f -size +100M".to_string()],
        false,
        RiskLevel::Low,
    ));

    diagnosis.fix(Fix::new(
        "clear_old_logs",
        "Clear Old System Logs",
        "Remove journal entries older than 7 days to free space",
        vec!["journalctl --vacuum-time=7d".to_string()],
        true,
        RiskLevel::Low,
    ));

    if let Some(dmesg) = probe("dmesg", &[]) {
        let lower = dmesg.to_lowercase();
        if lower.contains("i/o error") || lower.contains("disk error") {
            diagnosis.finding("Disk I/O errors detected in kernel log");

            diagnosis.fix(Fix::new(
                "check_disk_health",
                "Check Disk Health",
                "Use SMART tools to check disk health and identify potential failures",
                vec!["smartctl -a /dev/sda".to_string()],
                true,
                RiskLevel::Low,
            ));

            diagnosis.fix(
                Fix::new(
                    "filesystem_check",
                    "Filesystem Check",
                    "Run filesystem check to repair errors (WARNING: unmounts the filesystem)",
                    vec![
                        "umount /dev/sda1".to_string(),
                        "fsck -f /dev/sda1".to_string(),
                        "mount /dev/sda1".to_string(),
                    ],
                    true,
                    RiskLevel::High,
                )
                .reversible(vec![
                    "mount /dev/sda1".to_string(),
                    "mount /dev/sda1".to_string(),
                ]),
            );
        }
    }

    diagnosis.fix(Fix::new(
        "test_disk_speed",
        "Test Disk Read Speed",
        "Measure buffered read performance of the primary disk",
        vec!["hdparm -t /dev/sda".to_string()],
        true,
        RiskLevel::Low,
    ));

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No disk issues detected");
    }

    diagnosis.fix(Fix::new(
        "disk_overview",
        "Disk Overview",
        "Display disk usage, inode usage and mounted filesystems",
        vec![
            "df -h".to_string(),
            "df -i".to_string(),
            "lsblk".to_string(),
            "findmnt".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn disk_diagnosis_always_offers_cleanup_and_overview() {
        let diagnosis = diagnose_disk_issues();
        let ids: Vec<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"clean_package_cache"));
        assert!(ids.contains(&"find_large_files"));
        assert_eq!(*ids.last().unwrap(), "disk_overview");
    }

    #[test]
    fn disk_fix_ids_are_distinct() {
        let diagnosis = diagnose_disk_issues();
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }
}
