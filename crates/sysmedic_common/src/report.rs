//! Post-scan system summary.
//!
//! Combines the aggregated check results with a snapshot of system facts
//! into a health-scored report the menu can render or save.

use crate::checks::{Results, Severity};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSummary {
    pub timestamp: DateTime<Local>,
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub uptime_secs: u64,
    pub total_memory_mb: u64,
    pub used_memory_mb: u64,
    pub load_average: [f64; 3],
    pub disks: Vec<DiskUsage>,
    /// 0-100; starts at 100 and loses points per finding severity.
    pub health_score: u8,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_gb: u64,
    pub used_gb: u64,
    pub used_percent: u8,
}

/// Build a summary from aggregated results plus a fresh fact snapshot.
pub fn generate(results: &Results) -> SystemSummary {
    let mut sys = System::new();
    sys.refresh_memory();

    let mib = 1024 * 1024;
    let load = System::load_average();

    let mut critical_issues = Vec::new();
    let mut warnings = Vec::new();
    for finding in results.all() {
        match finding.severity {
            Severity::Critical | Severity::Error => critical_issues.push(finding.message.clone()),
            Severity::Warning => warnings.push(finding.message.clone()),
            Severity::Info => {}
        }
    }

    SystemSummary {
        timestamp: Local::now(),
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        os: format!(
            "{} {}",
            System::name().unwrap_or_else(|| "unknown".to_string()),
            System::os_version().unwrap_or_default()
        ),
        kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        uptime_secs: System::uptime(),
        total_memory_mb: sys.total_memory() / mib,
        used_memory_mb: sys.used_memory() / mib,
        load_average: [load.one, load.five, load.fifteen],
        disks: disk_usage(),
        health_score: health_score(results),
        critical_issues,
        warnings,
        recommendations: recommendations(results),
    }
}

fn disk_usage() -> Vec<DiskUsage> {
    let gib = 1024 * 1024 * 1024;
    Disks::new_with_refreshed_list()
        .list()
        .iter()
        .filter(|d| {
            let mount = d.mount_point().to_string_lossy();
            !mount.starts_with("/proc") && !mount.starts_with("/sys") && d.total_space() > 0
        })
        .map(|d| {
            let total = d.total_space();
            let used = total.saturating_sub(d.available_space());
            DiskUsage {
                mount_point: d.mount_point().to_string_lossy().into_owned(),
                total_gb: total / gib,
                used_gb: used / gib,
                used_percent: (used * 100 / total) as u8,
            }
        })
        .collect()
}

/// 100 minus 20 per critical, 10 per error, 5 per warning, floored at 0.
pub fn health_score(results: &Results) -> u8 {
    let mut penalty: u32 = 0;
    for finding in results.all() {
        penalty += match finding.severity {
            Severity::Critical => 20,
            Severity::Error => 10,
            Severity::Warning => 5,
            Severity::Info => 0,
        };
    }
    100u32.saturating_sub(penalty) as u8
}

fn recommendations(results: &Results) -> Vec<String> {
    let mut recommendations = Vec::new();

    for finding in results.all() {
        if finding.severity < Severity::Warning {
            continue;
        }
        let message = finding.message.to_lowercase();
        let advice = if message.contains("disk usage") || message.contains("filesystem") {
            "Free disk space: clean the package cache and vacuum old journal entries"
        } else if message.contains("memory") {
            "Investigate memory usage: ps aux --sort=-pmem"
        } else if message.contains("service") || message.contains("failed") {
            "Inspect failed services: systemctl --failed"
        } else if message.contains("package") {
            "Repair the package system: apt-get -f install"
        } else if message.contains("network") || message.contains("dns") {
            "Check network configuration: ip addr show and /etc/resolv.conf"
        } else {
            continue;
        };
        let advice = advice.to_string();
        if !recommendations.contains(&advice) {
            recommendations.push(advice);
        }
    }

    recommendations
}

/// Render the summary as pretty JSON, for piping into other tooling.
pub fn format_json(summary: &SystemSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Render the summary as plain text, critical issues first.
pub fn format_text(summary: &SystemSummary) -> String {
    let mut out = String::new();

    out.push_str("SYSTEM REPORT\n");
    out.push_str("=============\n\n");
    out.push_str(&format!("Host: {} ({})\n", summary.hostname, summary.os));
    out.push_str(&format!("Kernel: {}\n", summary.kernel));
    out.push_str(&format!(
        "Memory: {} / {} MB\n",
        summary.used_memory_mb, summary.total_memory_mb
    ));
    out.push_str(&format!(
        "Load: {:.2} {:.2} {:.2}\n",
        summary.load_average[0], summary.load_average[1], summary.load_average[2]
    ));
    out.push_str(&format!("Health score: {}/100\n\n", summary.health_score));

    if !summary.critical_issues.is_empty() {
        out.push_str("CRITICAL ISSUES\n");
        for issue in &summary.critical_issues {
            out.push_str(&format!("  ! {}\n", issue));
        }
        out.push('\n');
    }

    if !summary.warnings.is_empty() {
        out.push_str("WARNINGS\n");
        for warning in &summary.warnings {
            out.push_str(&format!("  * {}\n", warning));
        }
        out.push('\n');
    }

    if !summary.disks.is_empty() {
        out.push_str("DISKS\n");
        for disk in &summary.disks {
            out.push_str(&format!(
                "  {} {} / {} GB ({}%)\n",
                disk.mount_point, disk.used_gb, disk.total_gb, disk.used_percent
            ));
        }
        out.push('\n');
    }

    if summary.recommendations.is_empty() {
        out.push_str("No actions recommended.\n");
    } else {
        out.push_str("RECOMMENDED ACTIONS\n");
        for rec in &summary.recommendations {
            out.push_str(&format!("  - {}\n", rec));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Finding;

    fn results_with(severities: &[Severity]) -> Results {
        let mut results = Results::new();
        for (i, severity) in severities.iter().enumerate() {
            let mut finding = Finding::new(format!("check-{}", i));
            finding.severity = *severity;
            finding.message = format!("finding {} at {:?}", i, severity);
            results.add(finding);
        }
        results
    }

    #[test]
    fn perfect_score_with_no_findings() {
        assert_eq!(health_score(&Results::new()), 100);
    }

    #[test]
    fn score_deducts_per_severity() {
        let results = results_with(&[Severity::Critical, Severity::Error, Severity::Warning]);
        assert_eq!(health_score(&results), 65);
    }

    #[test]
    fn score_floors_at_zero() {
        let results = results_with(&[Severity::Critical; 10]);
        assert_eq!(health_score(&results), 0);
    }

    #[test]
    fn info_findings_cost_nothing() {
        let results = results_with(&[Severity::Info, Severity::Info]);
        assert_eq!(health_score(&results), 100);
    }

    #[test]
    fn format_lists_critical_before_warnings() {
        let mut results = Results::new();
        let mut warn = Finding::new("w");
        warn.severity = Severity::Warning;
        warn.message = "disk usage high".to_string();
        results.add(warn);
        let mut crit = Finding::new("c");
        crit.severity = Severity::Critical;
        crit.message = "disk usage critical".to_string();
        results.add(crit);

        let text = format_text(&generate(&results));
        let crit_pos = text.find("CRITICAL ISSUES").unwrap();
        let warn_pos = text.find("WARNINGS").unwrap();
        assert!(crit_pos < warn_pos);
    }

    #[test]
    fn recommendations_deduplicate() {
        let mut results = Results::new();
        for _ in 0..3 {
            let mut f = Finding::new("disk");
            f.severity = Severity::Warning;
            f.message = "Disk usage high: 90%".to_string();
            results.add(f);
        }
        let recs = recommendations(&results);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn empty_results_render_cleanly() {
        let text = format_text(&generate(&Results::new()));
        assert!(text.contains("Health score: 100/100"));
        assert!(text.contains("No actions recommended."));
    }

    #[test]
    fn json_round_trips() {
        let summary = generate(&Results::new());
        let json = format_json(&summary).unwrap();
        let parsed: SystemSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.health_score, summary.health_score);
        assert_eq!(parsed.hostname, summary.hostname);
    }
}
