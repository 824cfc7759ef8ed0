//! Systemd service state check. Registered only for elevated sessions:
//! unit state for system services is only fully visible to root.

use super::logs::failed_units;
use super::{Check, Finding, Severity};
use crate::probe::probe;

pub struct ServicesCheck;

impl Check for ServicesCheck {
    fn name(&self) -> &'static str {
        "System Services"
    }

    fn requires_root(&self) -> bool {
        true
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());

        let failed = failed_units();
        if failed.is_empty() {
            finding.escalate(Severity::Info, "No failed services");
        } else {
            finding.escalate(
                Severity::Error,
                format!("{} failed service(s) detected", failed.len()),
            );
            for unit in &failed {
                finding.detail(format!("  - {}", unit));
            }
        }

        if let Some(state) = probe("systemctl", &["is-system-running"]) {
            finding.detail(format!("System state: {}", state.trim()));
        }

        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_check_declares_root_requirement() {
        assert!(ServicesCheck.requires_root());
    }

    #[test]
    fn services_check_never_panics() {
        let finding = ServicesCheck.run();
        assert_eq!(finding.name, "System Services");
    }
}
