//! Filesystem mount state check.

use super::{Check, Finding, Severity};
use crate::probe::probe_lenient;

pub struct FilesystemCheck;

impl Check for FilesystemCheck {
    fn name(&self) -> &'static str {
        "Filesystem"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());
        finding.message = "Filesystem analysis completed".to_string();

        let read_only = read_only_mounts();
        if !read_only.is_empty() {
            finding.escalate(Severity::Error, "Read-only filesystems detected");
            finding.detail("Read-only mounts:".to_string());
            for mount in &read_only {
                finding.detail(format!("  - {}", mount));
            }
        }

        let fstab_issues = fstab_issues();
        if !fstab_issues.is_empty() {
            finding.escalate(Severity::Warning, "fstab verification reported issues");
            for issue in &fstab_issues {
                finding.detail(format!("  - {}", issue));
            }
        }

        let recovered = lost_found_entries();
        if !recovered.is_empty() {
            finding.escalate(
                Severity::Warning,
                "Recovered files present in lost+found (past filesystem repair)",
            );
            for entry in &recovered {
                finding.detail(format!("  - {}", entry));
            }
        }

        if finding.severity == Severity::Info {
            finding.detail("All filesystems mounted read-write".to_string());
        }

        finding
    }
}

/// Physical mounts currently mounted read-only, from /proc/mounts.
pub(crate) fn read_only_mounts() -> Vec<String> {
    let Ok(mounts) = std::fs::read_to_string("/proc/mounts") else {
        return Vec::new();
    };

    mounts
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let _fstype = fields.next()?;
            let options = fields.next()?;

            if !device.starts_with("/dev/") {
                return None;
            }
            let read_only = options.split(',').any(|o| o == "ro");
            read_only.then(|| mount_point.to_string())
        })
        .collect()
}

fn fstab_issues() -> Vec<String> {
    let Some(output) = probe_lenient("findmnt", &["--verify"]) else {
        return Vec::new();
    };

    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("Success"))
        .filter(|line| line.contains("[E]") || line.contains("[W]"))
        .map(|line| line.to_string())
        .collect()
}

fn lost_found_entries() -> Vec<String> {
    ["/lost+found", "/home/lost+found", "/var/lost+found"]
        .iter()
        .filter_map(|dir| {
            let entries = std::fs::read_dir(dir).ok()?;
            let count = entries.count();
            (count > 0).then(|| format!("{} ({} items)", dir, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_check_never_panics() {
        let finding = FilesystemCheck.run();
        assert_eq!(finding.name, "Filesystem");
        assert!(!finding.message.is_empty());
    }

    #[test]
    fn read_only_mounts_skips_virtual_filesystems() {
        // /proc/mounts always lists proc and sysfs; neither is a /dev mount
        // so neither may ever appear in the result.
        let mounts = read_only_mounts();
        assert!(mounts.iter().all(|m| m != "/proc" && m != "/sys"));
    }
}
