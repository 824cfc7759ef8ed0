//! Free-text issue diagnosis.
//!
//! The operator describes a problem in their own words; trigger-word
//! matching maps the description onto symptom categories, each of which
//! contributes one block of investigation fixes. Two universal blocks
//! (general troubleshooting and information gathering) are always
//! appended, so even an empty description yields a usable fix list.

use super::Diagnosis;
use crate::fixes::{Fix, RiskLevel};

/// Keyword categories, in the fixed order their fix blocks are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Boot,
    Network,
    Performance,
    Disk,
    Services,
    Graphics,
    Audio,
    Packages,
    Permissions,
    Logs,
    Hardware,
    Security,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Boot => "boot",
            Category::Network => "network",
            Category::Performance => "performance",
            Category::Disk => "disk",
            Category::Services => "services",
            Category::Graphics => "graphics",
            Category::Audio => "audio",
            Category::Packages => "packages",
            Category::Permissions => "permissions",
            Category::Logs => "logs",
            Category::Hardware => "hardware",
            Category::Security => "security",
        }
    }
}

/// Trigger substrings per category. A category is detected when any of
/// its triggers is a substring of any whitespace token of the lowercased
/// description; the first matching trigger wins and the category is
/// counted at most once. Output order is this table's order, not the
/// order words appear in the input.
const CATEGORY_TRIGGERS: &[(Category, &[&str])] = &[
    (
        Category::Boot,
        &["boot", "startup", "grub", "start", "starting", "boots", "booting"],
    ),
    (
        Category::Network,
        &["network", "internet", "wifi", "ethernet", "connection", "dns", "ip", "ping", "connect"],
    ),
    (
        Category::Performance,
        &["slow", "fast", "performance", "lag", "freeze", "hang", "cpu", "memory", "ram"],
    ),
    (
        Category::Disk,
        &["disk", "storage", "space", "full", "hdd", "ssd", "filesystem", "mount"],
    ),
    (
        Category::Services,
        &["service", "daemon", "systemd", "process", "running", "stopped"],
    ),
    (
        Category::Graphics,
        &["graphics", "display", "screen", "resolution", "x11", "wayland", "nvidia", "amd"],
    ),
    (
        Category::Audio,
        &["audio", "sound", "speaker", "microphone", "alsa", "pulseaudio"],
    ),
    (
        Category::Packages,
        &["package", "apt", "install", "software", "application", "program"],
    ),
    (
        Category::Permissions,
        &["permission", "access", "denied", "sudo", "root", "user", "group"],
    ),
    (
        Category::Logs,
        &["log", "error", "warning", "journal", "syslog", "dmesg"],
    ),
    (
        Category::Hardware,
        &["hardware", "device", "driver", "usb", "bluetooth", "keyboard", "mouse"],
    ),
    (
        Category::Security,
        &["security", "firewall", "ssh", "login", "password", "authentication"],
    ),
];

/// Diagnose a user-described issue.
pub fn diagnose_custom_issue(user_description: &str) -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Custom Issue Diagnosis");

    let description = user_description.trim().to_lowercase();

    if description.is_empty() {
        diagnosis.finding("No issue description provided");
        append_general_fixes(&mut diagnosis);
        append_information_fixes(&mut diagnosis);
        return diagnosis;
    }

    diagnosis.finding(format!("Analyzing issue: {}", user_description));

    let categories = detect_categories(&description);
    diagnosis.finding(format!(
        "Detected keywords: {}",
        categories
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    for category in &categories {
        diagnosis.fix(category_fix(*category));
    }

    append_general_fixes(&mut diagnosis);
    append_information_fixes(&mut diagnosis);

    if categories.is_empty() {
        diagnosis.finding("No specific keywords detected - providing general troubleshooting steps");
    } else {
        diagnosis.finding("Providing targeted troubleshooting based on detected keywords");
    }

    diagnosis
}

/// Categories detected in the (lowercased) description, in table order.
pub fn detect_categories(description: &str) -> Vec<Category> {
    let tokens: Vec<&str> = description.split_whitespace().collect();

    CATEGORY_TRIGGERS
        .iter()
        .filter(|(_, triggers)| {
            tokens
                .iter()
                .any(|token| triggers.iter().any(|trigger| token.contains(trigger)))
        })
        .map(|(category, _)| *category)
        .collect()
}

/// The investigation fix block for one detected category.
fn category_fix(category: Category) -> Fix {
    match category {
        Category::Boot => Fix::new(
            "check_boot_issues",
            "Check Boot Issues",
            "Examine boot process and bootloader state",
            vec![
                "systemctl is-system-running".to_string(),
                "journalctl -b -p err".to_string(),
                "lsblk".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Network => Fix::new(
            "diagnose_network",
            "Diagnose Network Issues",
            "Check network configuration and connectivity",
            vec![
                "ip addr show".to_string(),
                "ip route show".to_string(),
                "ping -c 3 8.8.8.8".to_string(),
                "cat /etc/resolv.conf".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Performance => Fix::new(
            "check_performance",
            "Check System Performance",
            "Analyze CPU, memory, and system load",
            vec![
                "uptime".to_string(),
                "free -h".to_string(),
                "ps aux --sort=-pcpu".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Disk => Fix::new(
            "check_disk_space",
            "Check Disk Usage",
            "Analyze disk space and filesystem health",
            vec![
                "df -h".to_string(),
                "df -i".to_string(),
                "lsblk".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Services => Fix::new(
            "check_services",
            "Check System Services",
            "Examine systemd services and processes",
            vec![
                "systemctl --failed".to_string(),
                "systemctl list-units --state=failed".to_string(),
                "systemctl is-system-running".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Graphics => Fix::new(
            "check_graphics",
            "Check Graphics Configuration",
            "Examine display and graphics driver status",
            vec![
                "lspci".to_string(),
                "lsmod".to_string(),
                "xrandr".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Audio => Fix::new(
            "check_audio",
            "Check Audio Configuration",
            "Examine audio devices and sound system",
            vec![
                "aplay -l".to_string(),
                "amixer".to_string(),
                "pactl info".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Packages => Fix::new(
            "check_packages",
            "Check Package System",
            "Examine APT package manager and installations",
            vec![
                "apt list --upgradable".to_string(),
                "apt-get check".to_string(),
                "dpkg --audit".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Permissions => Fix::new(
            "check_permissions",
            "Check File Permissions",
            "Examine user permissions and access rights",
            vec![
                "id".to_string(),
                "groups".to_string(),
                "sudo -l".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Logs => Fix::new(
            "check_logs",
            "Check System Logs",
            "Scan the journal and kernel log for recent errors",
            vec![
                "journalctl -p err -n 50 --no-pager".to_string(),
                "journalctl -k -p warning -n 20 --no-pager".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Hardware => Fix::new(
            "check_hardware",
            "Check Hardware Status",
            "Examine hardware devices and drivers",
            vec![
                "lspci".to_string(),
                "lsusb".to_string(),
                "lsmod".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
        Category::Security => Fix::new(
            "check_security",
            "Check Security Posture",
            "Review login activity, open ports and firewall state",
            vec![
                "last -n 10".to_string(),
                "ss -tulpn".to_string(),
                "journalctl -u ssh -n 20 --no-pager".to_string(),
            ],
            false,
            RiskLevel::Low,
        ),
    }
}

/// Universal block one: general troubleshooting steps.
fn append_general_fixes(diagnosis: &mut Diagnosis) {
    diagnosis.fix(Fix::new(
        "system_overview",
        "System Overview",
        "Get a comprehensive overview of system status",
        vec![
            "uname -a".to_string(),
            "uptime".to_string(),
            "whoami".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis.fix(Fix::new(
        "check_recent_changes",
        "Check Recent Changes",
        "Look for recent system changes that might have caused issues",
        vec![
            "last -n 10".to_string(),
            "journalctl --since -1h -p warning --no-pager".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis.fix(Fix::new(
        "basic_connectivity_test",
        "Basic Connectivity Test",
        "Test basic network and system connectivity",
        vec![
            "ping -c 3 127.0.0.1".to_string(),
            "ping -c 3 8.8.8.8".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis.fix(Fix::new(
        "restart_common_services",
        "Restart Common Services",
        "Restart commonly problematic services",
        vec![
            "systemctl restart networking".to_string(),
            "systemctl restart systemd-resolved".to_string(),
        ],
        true,
        RiskLevel::Medium,
    ));
}

/// Universal block two: information gathering.
fn append_information_fixes(diagnosis: &mut Diagnosis) {
    diagnosis.fix(Fix::new(
        "gather_system_info",
        "Gather Detailed System Information",
        "Collect comprehensive system information for troubleshooting",
        vec![
            "uname -a".to_string(),
            "lscpu".to_string(),
            "free -h".to_string(),
            "df -h".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis.fix(Fix::new(
        "check_system_logs",
        "Check System Logs",
        "Examine system logs for error messages and warnings",
        vec![
            "journalctl -p err --since -24h --no-pager".to_string(),
            "systemctl --failed".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));
}

/// Static troubleshooting advice shown alongside a custom diagnosis.
pub fn troubleshooting_suggestions() -> &'static [&'static str] {
    &[
        "Try restarting the specific service or application that's causing issues",
        "Check system logs for error messages around the time the issue started",
        "Verify that you have sufficient disk space and memory",
        "Test in a different user account to rule out user-specific configuration issues",
        "Check if the issue persists after a system reboot",
        "Verify network connectivity if the issue involves internet access",
        "Look for recent system updates or changes that might have caused the issue",
        "Check for hardware issues by examining dmesg output",
        "Try running the problematic command with elevated privileges (sudo)",
        "Search online for error messages you encounter",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_description_still_yields_fixes() {
        let diagnosis = diagnose_custom_issue("");
        assert!(diagnosis
            .findings
            .iter()
            .any(|f| f.contains("No issue description provided")));
        assert!(!diagnosis.fixes.is_empty());
        // Only the two universal blocks.
        let ids: Vec<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"system_overview"));
        assert!(ids.contains(&"gather_system_info"));
        assert!(!ids.contains(&"check_boot_issues"));
    }

    #[test]
    fn whitespace_only_description_counts_as_empty() {
        let diagnosis = diagnose_custom_issue("   \t  ");
        assert!(diagnosis
            .findings
            .iter()
            .any(|f| f.contains("No issue description provided")));
    }

    #[test]
    fn slow_network_detects_both_categories_plus_universal_blocks() {
        let diagnosis = diagnose_custom_issue("my network is slow");
        let ids: Vec<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();

        assert!(ids.contains(&"diagnose_network"));
        assert!(ids.contains(&"check_performance"));
        assert!(ids.contains(&"system_overview"));
        assert!(ids.contains(&"gather_system_info"));

        // Network precedes performance in the fixed enumeration order,
        // regardless of word order in the input.
        let net = ids.iter().position(|i| *i == "diagnose_network").unwrap();
        let perf = ids.iter().position(|i| *i == "check_performance").unwrap();
        assert!(net < perf);
    }

    #[test]
    fn multiple_triggers_for_one_category_yield_one_fix() {
        let diagnosis = diagnose_custom_issue("wifi ethernet dns connection broken");
        let network_fixes = diagnosis
            .fixes
            .iter()
            .filter(|f| f.id == "diagnose_network")
            .count();
        assert_eq!(network_fixes, 1);
    }

    #[test]
    fn detection_uses_substring_of_tokens() {
        // "rebooting" contains "boot"; "again" matches no trigger.
        let categories = detect_categories("rebooting again");
        assert_eq!(categories, [Category::Boot]);
    }

    #[test]
    fn category_order_is_fixed_enumeration_order() {
        let categories = detect_categories("password program usb sound slow grub");
        assert_eq!(
            categories,
            [
                Category::Boot,
                Category::Performance,
                Category::Audio,
                Category::Packages,
                Category::Hardware,
                Category::Security,
            ]
        );
    }

    #[test]
    fn all_category_fix_blocks_are_valid_and_distinct() {
        let all = [
            Category::Boot,
            Category::Network,
            Category::Performance,
            Category::Disk,
            Category::Services,
            Category::Graphics,
            Category::Audio,
            Category::Packages,
            Category::Permissions,
            Category::Logs,
            Category::Hardware,
            Category::Security,
        ];
        let mut ids = HashSet::new();
        for category in all {
            let fix = category_fix(category);
            assert!(crate::fixes::validate(&fix).is_ok());
            assert!(ids.insert(fix.id.clone()), "duplicate id {}", fix.id);
        }
    }

    #[test]
    fn custom_diagnosis_fix_ids_are_distinct() {
        let diagnosis =
            diagnose_custom_issue("slow network disk service graphics audio package login log usb");
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }

    #[test]
    fn universal_blocks_follow_category_blocks() {
        let diagnosis = diagnose_custom_issue("disk full");
        let ids: Vec<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        let disk = ids.iter().position(|i| *i == "check_disk_space").unwrap();
        let general = ids.iter().position(|i| *i == "system_overview").unwrap();
        let info = ids.iter().position(|i| *i == "gather_system_info").unwrap();
        assert!(disk < general);
        assert!(general < info);
    }

    #[test]
    fn suggestions_are_nonempty() {
        assert!(troubleshooting_suggestions().len() >= 5);
    }
}
