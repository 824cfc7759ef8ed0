//! Performance problem diagnosis.

use super::Diagnosis;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::probe;
use sysinfo::System;

pub fn diagnose_performance_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Performance Issues");

    let mut sys = System::new();
    sys.refresh_cpu();
    // CPU usage needs two samples a beat apart.
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();
    sys.refresh_memory();

    let cpu_usage = sys.global_cpu_info().cpu_usage();
    if cpu_usage > 80.0 {
        diagnosis.finding(format!("High CPU usage: {:.1}%", cpu_usage));
        for line in top_processes("-pcpu", "CPU") {
            diagnosis.finding(line);
        }
        diagnosis.fix(Fix::new(
            "view_cpu_hogs",
            "View CPU-Heavy Processes",
            "Show the processes consuming the most CPU",
            vec!["ps aux --sort=-pcpu".to_string()],
            false,
            RiskLevel::Low,
        ));
    } else {
        diagnosis.finding(format!("CPU usage normal: {:.1}%", cpu_usage));
    }

    let total_memory = sys.total_memory();
    if total_memory > 0 {
        let used_percent = sys.used_memory() as f64 * 100.0 / total_memory as f64;
        if used_percent > 85.0 {
            diagnosis.finding(format!("High memory usage: {:.1}%", used_percent));
            for line in top_processes("-pmem", "MEM") {
                diagnosis.finding(line);
            }
            diagnosis.fix(Fix::new(
                "clear_caches",
                "Clear System Caches",
                "Flush filesystem buffers and drop the page cache",
                vec![
                    "sync".to_string(),
                    "sysctl vm.drop_caches=3".to_string(),
                ],
                true,
                RiskLevel::Low,
            ));
        } else {
            diagnosis.finding(format!("Memory usage normal: {:.1}%", used_percent));
        }
    }

    let load = System::load_average();
    let cores = num_cpus::get();
    if load.one > (cores * 2) as f64 {
        diagnosis.finding(format!(
            "High system load: {:.2} (cores: {})",
            load.one, cores
        ));
        diagnosis.fix(Fix::new(
            "view_processes",
            "View Running Processes",
            "Show the busiest processes on the system",
            vec!["ps aux --sort=-pcpu".to_string()],
            false,
            RiskLevel::Low,
        ));
    } else {
        diagnosis.finding(format!("System load normal: {:.2}", load.one));
    }

    let swap_total = sys.total_swap();
    if swap_total > 0 {
        let swap_percent = sys.used_swap() as f64 * 100.0 / swap_total as f64;
        if swap_percent > 50.0 {
            diagnosis.finding(format!(
                "High swap usage: {:.1}% - possible memory pressure",
                swap_percent
            ));
            diagnosis.fix(Fix::new(
                "clear_swap",
                "Clear Swap Memory",
                "Cycle swap off and on (requires enough free RAM to absorb it)",
                vec!["swapoff -a".to_string(), "swapon -a".to_string()],
                true,
                RiskLevel::High,
            ));
        }
    }

    diagnosis.fix(Fix::new(
        "performance_overview",
        "Performance Overview",
        "Show load, memory and the busiest processes",
        vec![
            "uptime".to_string(),
            "free -h".to_string(),
            "ps aux --sort=-pcpu".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

/// Top three entries from ps sorted by the given key, as finding lines.
fn top_processes(sort: &str, label: &str) -> Vec<String> {
    let Some(output) = probe("ps", &["aux", &format!("--sort={}", sort)]) else {
        return Vec::new();
    };

    let mut lines = vec![format!("Top {} consumers:", label)];
    for line in output.lines().skip(1).take(3) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() > 10 {
            let usage = if label == "CPU" { fields[2] } else { fields[3] };
            lines.push(format!("  - {}: {}% {}", fields[10], usage, label));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn performance_diagnosis_ends_with_overview() {
        let diagnosis = diagnose_performance_issues();
        assert_eq!(diagnosis.fixes.last().unwrap().id, "performance_overview");
        assert!(!diagnosis.findings.is_empty());
    }

    #[test]
    fn performance_fix_ids_are_distinct() {
        let diagnosis = diagnose_performance_issues();
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }
}
