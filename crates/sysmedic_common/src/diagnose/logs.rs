//! System log diagnosis.

use super::Diagnosis;
use crate::checks::log_facts;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::probe;
use std::collections::HashMap;

pub fn diagnose_log_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("System Log Issues");

    if let Some(journal_mb) = log_facts::journal_size_mb() {
        if journal_mb > 1000.0 {
            diagnosis.finding(format!(
                "systemd journal is using {:.1} MB of disk space",
                journal_mb
            ));

            diagnosis.fix(Fix::new(
                "vacuum_journal_time",
                "Clean Old Journal Entries (30 days)",
                "Remove journal entries older than 30 days to free disk space",
                vec!["journalctl --vacuum-time=30d".to_string()],
                true,
                RiskLevel::Low,
            ));

            diagnosis.fix(Fix::new(
                "vacuum_journal_size",
                "Limit Journal Size (500MB)",
                "Limit the systemd journal to 500MB total size",
                vec!["journalctl --vacuum-size=500M".to_string()],
                true,
                RiskLevel::Low,
            ));
        }
    }

    let persistent = persistent_error_patterns();
    if !persistent.is_empty() {
        diagnosis.finding(format!(
            "Found {} persistent error patterns in logs",
            persistent.len()
        ));
        for (i, pattern) in persistent.iter().enumerate() {
            if i >= 3 {
                diagnosis.finding(format!(
                    "  ... and {} more error patterns",
                    persistent.len() - 3
                ));
                break;
            }
            diagnosis.finding(format!("  - {}", pattern));
        }

        diagnosis.fix(Fix::new(
            "analyze_errors",
            "Analyze Recent Errors",
            "Display recent error messages for detailed analysis",
            vec!["journalctl -p err --since -24h --no-pager".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    let failed = log_facts::failed_units();
    if !failed.is_empty() {
        diagnosis.finding("Services with errors detected:");
        for service in &failed {
            diagnosis.finding(format!("  - {}", service));
        }

        diagnosis.fix(Fix::new(
            "restart_failed_services",
            "Restart Failed Services",
            "Attempt to restart all currently failed services",
            failed
                .iter()
                .map(|unit| format!("systemctl restart {}", unit))
                .collect(),
            true,
            RiskLevel::Medium,
        ));

        diagnosis.fix(Fix::new(
            "show_service_status",
            "Show Failed Service Details",
            "Display detailed status of all failed services",
            vec!["systemctl --failed".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    let core_dumps = core_dump_count();
    if core_dumps > 0 {
        diagnosis.finding(format!("Found {} core dumps on system", core_dumps));

        diagnosis.fix(Fix::new(
            "list_core_dumps",
            "List Core Dumps",
            "Show all core dumps with details",
            vec!["coredumpctl list".to_string()],
            false,
            RiskLevel::Low,
        ));

        diagnosis.fix(Fix::new(
            "clean_core_dumps",
            "Clean Old Core Dumps",
            "Remove old core dumps, keeping at least 1GB of disk free",
            vec!["coredumpctl vacuum --keep-free=1G".to_string()],
            true,
            RiskLevel::Low,
        ));
    }

    let kernel_issues = kernel_issues();
    if !kernel_issues.is_empty() {
        diagnosis.finding("Kernel issues detected:");
        for issue in &kernel_issues {
            diagnosis.finding(format!("  - {}", issue));
        }

        diagnosis.fix(Fix::new(
            "show_kernel_messages",
            "Show Recent Kernel Messages",
            "Display recent kernel messages and errors",
            vec!["journalctl -k --since -24h --no-pager".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No significant log issues detected");
    }

    diagnosis.fix(Fix::new(
        "logs_overview",
        "Log Overview",
        "Show recent warnings and overall service state",
        vec![
            "journalctl --since -1h -p warning --no-pager".to_string(),
            "systemctl --failed".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

/// Error messages that repeat more than three times over the last day,
/// with variable parts (pids, addresses, devices) normalized away.
fn persistent_error_patterns() -> Vec<String> {
    let Some(output) = probe(
        "journalctl",
        &["-p", "err", "--since", "24 hours ago", "--no-pager"],
    ) else {
        return Vec::new();
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        // Strip "Mon DD HH:MM:SS host" before normalizing.
        let message = line.splitn(6, ' ').nth(5).unwrap_or(line);
        *counts.entry(normalize_error_message(message)).or_default() += 1;
    }

    let mut patterns: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 3)
        .map(|(message, count)| format!("{} (occurred {} times)", message, count))
        .collect();
    patterns.sort();
    patterns
}

fn normalize_error_message(message: &str) -> String {
    use regex::Regex;

    // Compiled per call; this path runs once per diagnosis.
    let replacements = [
        (r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}", "[TIME]"),
        (r"\[\d+\]", "[PID]"),
        (r"pid \d+", "pid [NUM]"),
        (r"\d+\.\d+\.\d+\.\d+", "[IP]"),
        (r"/dev/\w+\d+", "[DEVICE]"),
    ];

    let mut normalized = message.to_string();
    for (pattern, replacement) in replacements {
        if let Ok(re) = Regex::new(pattern) {
            normalized = re.replace_all(&normalized, replacement).into_owned();
        }
    }

    if normalized.len() > 100 {
        let mut cut = 100;
        while !normalized.is_char_boundary(cut) {
            cut -= 1;
        }
        normalized.truncate(cut);
        normalized.push_str("...");
    }
    normalized
}

fn core_dump_count() -> usize {
    probe("coredumpctl", &["list", "--no-pager", "--no-legend"])
        .map(|output| output.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0)
}

fn kernel_issues() -> Vec<String> {
    let Some(output) = probe("dmesg", &[]) else {
        return Vec::new();
    };

    let lower = output.to_lowercase();
    [
        "kernel panic",
        "oops:",
        "call trace:",
        "segfault",
        "general protection fault",
        "hardware error",
    ]
    .iter()
    .filter(|pattern| lower.contains(*pattern))
    .map(|pattern| format!("Detected: {}", pattern))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn normalization_collapses_variable_parts() {
        let a = normalize_error_message("disk /dev/sda1 failed for pid 123");
        let b = normalize_error_message("disk /dev/sdb2 failed for pid 456");
        assert_eq!(a, b);
        assert!(a.contains("[DEVICE]"));
        assert!(a.contains("pid [NUM]"));
    }

    #[test]
    fn normalization_truncates_long_messages() {
        let long = "x".repeat(300);
        let normalized = normalize_error_message(&long);
        assert!(normalized.len() <= 103);
        assert!(normalized.ends_with("..."));
    }

    #[test]
    fn normalization_replaces_addresses() {
        let n = normalize_error_message("refused connection from 192.168.1.50 [2231]");
        assert!(n.contains("[IP]"));
        assert!(n.contains("[PID]"));
    }

    #[test]
    fn logs_diagnosis_ends_with_overview() {
        let diagnosis = diagnose_log_issues();
        assert_eq!(diagnosis.fixes.last().unwrap().id, "logs_overview");
        assert!(!diagnosis.findings.is_empty());
    }

    #[test]
    fn logs_fix_ids_are_distinct() {
        let diagnosis = diagnose_log_issues();
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }
}
