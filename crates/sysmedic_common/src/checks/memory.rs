//! Memory and swap usage check.

use super::{Check, Finding, Severity};
use sysinfo::System;

const MIB: u64 = 1024 * 1024;

pub struct MemoryCheck;

impl Check for MemoryCheck {
    fn name(&self) -> &'static str {
        "Memory Usage"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());

        let mut sys = System::new();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            finding.escalate(Severity::Error, "Failed to check memory usage");
            return finding;
        }

        let used = sys.used_memory();
        let available = sys.available_memory();
        let used_percent = used as f64 * 100.0 / total as f64;

        finding.detail(format!("Total: {} MB", total / MIB));
        finding.detail(format!("Available: {} MB", available / MIB));
        finding.detail(format!("Used: {} MB ({:.1}%)", used / MIB, used_percent));

        if used_percent > 90.0 {
            finding.escalate(
                Severity::Error,
                format!("Memory usage critical: {:.1}%", used_percent),
            );
        } else if used_percent > 80.0 {
            finding.escalate(
                Severity::Warning,
                format!("Memory usage high: {:.1}%", used_percent),
            );
        } else {
            finding.escalate(
                Severity::Info,
                format!("Memory usage OK: {:.1}%", used_percent),
            );
        }

        let swap_total = sys.total_swap();
        let swap_used = sys.used_swap();
        finding.detail(format!("Swap Total: {} MB", swap_total / MIB));

        if swap_total == 0 {
            finding.detail("Warning: No swap space configured".to_string());
        } else {
            let swap_percent = swap_used as f64 * 100.0 / swap_total as f64;
            finding.detail(format!(
                "Swap Used: {} MB ({:.1}%)",
                swap_used / MIB,
                swap_percent
            ));
            if swap_percent > 50.0 {
                let message = format!(
                    "{} (High swap usage indicates memory pressure)",
                    finding.message
                );
                finding.escalate(Severity::Warning, message);
            }
        }

        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_check_reports_totals() {
        let finding = MemoryCheck.run();
        assert_eq!(finding.name, "Memory Usage");
        assert!(finding.details.iter().any(|d| d.starts_with("Total:")));
        assert!(finding.message.contains("Memory usage") || finding.message.contains("Failed"));
    }
}
