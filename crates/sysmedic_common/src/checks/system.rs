//! Basic system identification check.

use super::{Check, Finding, Severity};
use std::collections::HashMap;
use sysinfo::System;

pub struct SystemInfoCheck;

impl Check for SystemInfoCheck {
    fn name(&self) -> &'static str {
        "System Information"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());

        let os = System::name().unwrap_or_else(|| "unknown".to_string());
        let version = System::os_version().unwrap_or_else(|| "unknown".to_string());
        let kernel = System::kernel_version().unwrap_or_else(|| "unknown".to_string());
        let hostname = System::host_name().unwrap_or_else(|| "unknown".to_string());

        finding.detail(format!("OS: {}", os));
        finding.detail(format!("Version: {}", version));
        finding.detail(format!("Kernel: {}", kernel));
        finding.detail(format!("Architecture: {}", std::env::consts::ARCH));
        finding.detail(format!("Hostname: {}", hostname));
        finding.detail(format!("Uptime: {}", format_uptime(System::uptime())));

        let os_release = read_os_release().unwrap_or_default();
        let id = os_release.get("ID").cloned().unwrap_or_default();
        let id_like = os_release.get("ID_LIKE").cloned().unwrap_or_default();

        let is_debian = os.to_lowercase().contains("debian")
            || id.to_lowercase().contains("debian")
            || id_like.to_lowercase().contains("debian");

        if !is_debian {
            finding.escalate(
                Severity::Warning,
                "This doesn't appear to be a Debian-based system",
            );
        } else if id.to_lowercase().contains("ubuntu") {
            finding.escalate(
                Severity::Info,
                format!("Ubuntu {} detected (Debian-based)", version),
            );
        } else if id.to_lowercase().contains("debian") {
            finding.escalate(Severity::Info, format!("Debian {} detected", version));
        } else {
            finding.escalate(
                Severity::Info,
                format!("Debian-based system detected: {} {}", os, version),
            );
        }

        finding
    }
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn read_os_release() -> Option<HashMap<String, String>> {
    let raw = std::fs::read_to_string("/etc/os-release").ok()?;
    let mut map = HashMap::new();
    for line in raw.lines() {
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.to_string(), value.trim_matches('"').to_string());
        }
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(90_061), "1d 1h 1m");
    }

    #[test]
    fn system_check_produces_details() {
        let finding = SystemInfoCheck.run();
        assert_eq!(finding.name, "System Information");
        assert!(finding.details.iter().any(|d| d.starts_with("Kernel:")));
        assert!(finding.details.iter().any(|d| d.starts_with("Uptime:")));
        assert!(!finding.message.is_empty());
    }
}
