//! Disk space and inode pressure check.

use super::{Check, Finding, Severity};
use crate::probe::probe;
use sysinfo::Disks;

const GIB: u64 = 1024 * 1024 * 1024;

pub struct DiskSpaceCheck;

impl Check for DiskSpaceCheck {
    fn name(&self) -> &'static str {
        "Disk Space"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"));

        let Some(root) = root else {
            finding.escalate(Severity::Error, "Failed to check disk space");
            return finding;
        };

        let total = root.total_space();
        let free = root.available_space();
        let used = total.saturating_sub(free);
        let usage_percent = if total > 0 { used * 100 / total } else { 0 };

        finding.detail(format!("Total: {} GB", total / GIB));
        finding.detail(format!("Used: {} GB ({}%)", used / GIB, usage_percent));
        finding.detail(format!("Free: {} GB", free / GIB));

        match usage_percent {
            96.. => finding.escalate(
                Severity::Critical,
                format!("Disk usage critical: {}%", usage_percent),
            ),
            86..=95 => finding.escalate(
                Severity::Warning,
                format!("Disk usage high: {}%", usage_percent),
            ),
            _ => finding.escalate(
                Severity::Info,
                format!("Disk usage OK: {}%", usage_percent),
            ),
        }

        if let Some(inode_percent) = root_inode_usage() {
            finding.detail(format!("Inode usage: {}%", inode_percent));
            if inode_percent > 90 {
                let message = format!(
                    "{} (High inode usage: {}%)",
                    finding.message, inode_percent
                );
                finding.escalate(Severity::Warning, message);
            }
        }

        finding
    }
}

/// Inode usage of the root filesystem in percent, via df. None when the
/// probe is unavailable.
fn root_inode_usage() -> Option<u64> {
    let output = probe("df", &["--output=ipcent", "/"])?;
    output
        .lines()
        .nth(1)
        .and_then(|line| line.trim().trim_end_matches('%').parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_check_reports_usage() {
        let finding = DiskSpaceCheck.run();
        assert_eq!(finding.name, "Disk Space");
        // Either real usage details or an explicit failure message.
        assert!(!finding.details.is_empty() || finding.severity == Severity::Error);
    }
}
