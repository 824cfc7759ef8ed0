//! Filesystem problem diagnosis.

use super::Diagnosis;
use crate::checks::filesystem_facts;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::{probe, probe_lenient};
use sysinfo::Disks;

pub fn diagnose_filesystem_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Filesystem Issues");

    let read_only = filesystem_facts::read_only_mounts();
    if !read_only.is_empty() {
        diagnosis.finding("Read-only filesystems detected:");
        for fs in &read_only {
            diagnosis.finding(format!("  - {}", fs));
        }

        diagnosis.fix(
            Fix::new(
                "remount_rw",
                "Remount Filesystems Read-Write",
                "Attempt to remount read-only filesystems as read-write",
                vec!["mount -o remount,rw /".to_string()],
                true,
                RiskLevel::Medium,
            )
            .reversible(vec!["mount -o remount,ro /".to_string()]),
        );

        diagnosis.fix(Fix::new(
            "check_filesystem_errors",
            "Check for Filesystem Errors",
            "Look for kernel messages that explain the read-only state",
            vec!["journalctl -k -p err -n 50 --no-pager".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    let space_issues = disk_space_issues();
    if !space_issues.is_empty() {
        diagnosis.finding("Disk space issues:");
        for issue in &space_issues {
            diagnosis.finding(format!("  - {}", issue));
        }

        diagnosis.fix(Fix::new(
            "clean_temp_files",
            "Clean Temporary Files",
            "Remove temporary files not accessed for a week",
            vec![
                "find /tmp -type f -atime +7 -delete".to_string(),
                "find /var/tmp -type f -atime +7 -delete".to_string(),
            ],
            true,
            RiskLevel::Low,
        ));

        diagnosis.fix(Fix::new(
            "clean_log_files",
            "Clean Old Log Files",
            "Trim the journal to the last 30 days",
            vec!["journalctl --vacuum-time=30d".to_string()],
            true,
            RiskLevel::Low,
        ));

        diagnosis.fix(Fix::new(
            "find_space_consumers",
            "Find Large Files",
            "Locate files that may be consuming excessive disk space",
            vec!["find / -xdev -type f -size +100M".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    let inode_issues = inode_issues();
    if !inode_issues.is_empty() {
        diagnosis.finding("Inode usage issues:");
        for issue in &inode_issues {
            diagnosis.finding(format!("  - {}", issue));
        }

        diagnosis.fix(Fix::new(
            "clean_small_files",
            "Clean Empty Files",
            "Remove empty files that consume inodes in temp directories",
            vec![
                "find /tmp -type f -size 0 -delete".to_string(),
                "find /var/tmp -type f -size 0 -delete".to_string(),
            ],
            true,
            RiskLevel::Low,
        ));
    }

    let corruption = corruption_signs();
    if !corruption.is_empty() {
        diagnosis.finding("Filesystem corruption detected:");
        for sign in &corruption {
            diagnosis.finding(format!("  - {}", sign));
        }

        diagnosis.fix(Fix::new(
            "schedule_fsck",
            "Schedule Filesystem Check",
            "Force a filesystem check on the next reboot",
            vec!["touch /forcefsck".to_string()],
            true,
            RiskLevel::High,
        ));
    }

    if has_failed_mount_units() {
        diagnosis.finding("Failed mount units in systemd");
        diagnosis.fix(Fix::new(
            "reload_systemd_mounts",
            "Reload Systemd Mount Units",
            "Reload unit files and restart the local filesystem target",
            vec![
                "systemctl daemon-reload".to_string(),
                "systemctl restart local-fs.target".to_string(),
            ],
            true,
            RiskLevel::Medium,
        ));

        diagnosis.fix(Fix::new(
            "check_fstab",
            "Validate fstab Configuration",
            "Check /etc/fstab for syntax errors and missing devices",
            vec!["findmnt --verify".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No significant filesystem issues detected");
    }

    diagnosis.fix(Fix::new(
        "filesystem_overview",
        "Filesystem Overview",
        "Display comprehensive filesystem information",
        vec![
            "df -h".to_string(),
            "df -i".to_string(),
            "findmnt".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

fn disk_space_issues() -> Vec<String> {
    let disks = Disks::new_with_refreshed_list();
    let watched = [("/", "Root"), ("/home", "Home"), ("/var", "Var"), ("/tmp", "Tmp")];

    watched
        .iter()
        .filter_map(|(path, name)| {
            let disk = disks
                .list()
                .iter()
                .find(|d| d.mount_point() == std::path::Path::new(path))?;
            let total = disk.total_space();
            if total == 0 {
                return None;
            }
            let used = total.saturating_sub(disk.available_space());
            let usage = used * 100 / total;
            if usage > 95 {
                Some(format!("{} filesystem critical: {}% full", name, usage))
            } else if usage > 85 {
                Some(format!("{} filesystem warning: {}% full", name, usage))
            } else {
                None
            }
        })
        .collect()
}

fn inode_issues() -> Vec<String> {
    let Some(output) = probe("df", &["-i"]) else {
        return Vec::new();
    };

    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                return None;
            }
            let filesystem = fields[0];
            if filesystem.starts_with("tmpfs") || filesystem.starts_with("devtmpfs") {
                return None;
            }
            let usage: u32 = fields[4].trim_end_matches('%').parse().ok()?;
            (usage > 90).then(|| format!("{}: {}% inode usage", fields[5], usage))
        })
        .collect()
}

fn corruption_signs() -> Vec<String> {
    let mut signs = Vec::new();

    for dir in ["/lost+found", "/home/lost+found", "/var/lost+found"] {
        if let Ok(entries) = std::fs::read_dir(dir) {
            let count = entries.count();
            if count > 0 {
                signs.push(format!("Files found in {} ({} items)", dir, count));
            }
        }
    }

    if let Some(dmesg) = probe("dmesg", &[]) {
        let lower = dmesg.to_lowercase();
        for pattern in ["ext4-fs error", "filesystem error", "bad magic number"] {
            if lower.contains(pattern) {
                signs.push(format!("Kernel log contains: {}", pattern));
            }
        }
    }

    signs
}

fn has_failed_mount_units() -> bool {
    probe_lenient(
        "systemctl",
        &["list-units", "--failed", "--type=mount", "--no-legend"],
    )
    .map(|output| output.lines().any(|l| !l.trim().is_empty()))
    .unwrap_or(false)
}
