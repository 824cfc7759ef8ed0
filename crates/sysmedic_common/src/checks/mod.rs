//! System health checks.
//!
//! Each check gathers one fact bundle and reports it as a severity-tagged
//! [`Finding`]. Findings are accumulated by an explicit [`Results`] value
//! owned by the caller - there is no ambient collection state.

mod disk;
pub(crate) mod filesystem;
pub(crate) mod logs;
mod memory;
pub(crate) mod network;
pub(crate) mod packages;
mod services;
mod system;

pub use disk::DiskSpaceCheck;
pub use filesystem::FilesystemCheck;
pub use logs::LogsCheck;
pub use memory::MemoryCheck;
pub use network::NetworkCheck;
pub use packages::PackagesCheck;
pub use services::ServicesCheck;
pub use system::SystemInfoCheck;

pub(crate) use network::list_interfaces as network_interfaces;
pub(crate) use self::filesystem as filesystem_facts;
pub(crate) use self::logs as log_facts;
pub(crate) use self::packages as package_facts;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Severity of a finding, ordered by escalation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// One severity-tagged observation from a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the check that produced this finding.
    pub name: String,
    pub severity: Severity,
    /// One-line summary.
    pub message: String,
    /// Supporting detail lines, in presentation order.
    pub details: Vec<String>,
    pub timestamp: DateTime<Local>,
}

impl Finding {
    pub fn new(name: impl Into<String>) -> Self {
        Finding {
            name: name.into(),
            severity: Severity::Info,
            message: String::new(),
            details: Vec::new(),
            timestamp: Local::now(),
        }
    }

    /// Raise severity, never lowering it. A check's overall severity is
    /// the maximum of what its probes saw.
    pub fn escalate(&mut self, severity: Severity, message: impl Into<String>) {
        if severity >= self.severity {
            self.severity = severity;
            self.message = message.into();
        }
    }

    pub fn detail(&mut self, line: impl Into<String>) {
        self.details.push(line.into());
    }
}

/// A collaborator that gathers one system fact.
pub trait Check {
    fn name(&self) -> &'static str;
    fn requires_root(&self) -> bool;
    fn run(&self) -> Finding;
}

/// Accumulates findings from any number of checks, preserving insertion
/// order. Repeated identical findings are intentionally kept; callers can
/// dedupe at presentation time if they want to.
#[derive(Debug, Clone, Default)]
pub struct Results {
    findings: Vec<Finding>,
    errors: Vec<String>,
    warnings: Vec<String>,
    info: Vec<String>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only mutator. Buckets the finding's message by severity:
    /// Error and Critical both land in the error view.
    pub fn add(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error | Severity::Critical => self.errors.push(finding.message.clone()),
            Severity::Warning => self.warnings.push(finding.message.clone()),
            Severity::Info => self.info.push(finding.message.clone()),
        }
        self.findings.push(finding);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn info(&self) -> &[String] {
        &self.info
    }

    pub fn all(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }
}

/// All checks appropriate for the current privilege context. The services
/// check inspects unit state that is only fully visible to root.
pub fn all_checks(is_root: bool) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = vec![
        Box::new(SystemInfoCheck),
        Box::new(DiskSpaceCheck),
        Box::new(MemoryCheck),
        Box::new(NetworkCheck),
        Box::new(LogsCheck),
        Box::new(PackagesCheck),
        Box::new(FilesystemCheck),
    ];

    if is_root {
        checks.push(Box::new(ServicesCheck));
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(name: &str, severity: Severity, message: &str) -> Finding {
        let mut f = Finding::new(name);
        f.severity = severity;
        f.message = message.to_string();
        f
    }

    #[test]
    fn severity_ordering_escalates() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn errors_view_includes_error_and_critical() {
        let mut results = Results::new();
        results.add(finding("a", Severity::Error, "disk failing"));
        results.add(finding("b", Severity::Critical, "disk full"));
        results.add(finding("c", Severity::Warning, "disk filling up"));
        results.add(finding("d", Severity::Info, "disk fine"));

        assert_eq!(results.errors(), &["disk failing", "disk full"]);
        assert_eq!(results.warnings(), &["disk filling up"]);
        assert_eq!(results.info(), &["disk fine"]);
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut results = Results::new();
        results.add(finding("first", Severity::Info, "one"));
        results.add(finding("second", Severity::Info, "two"));
        results.add(finding("third", Severity::Info, "three"));

        let names: Vec<&str> = results.all().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut results = Results::new();
        results.add(finding("x", Severity::Warning, "same"));
        results.add(finding("x", Severity::Warning, "same"));
        assert_eq!(results.warnings().len(), 2);
    }

    #[test]
    fn escalate_never_downgrades() {
        let mut f = Finding::new("test");
        f.escalate(Severity::Error, "bad");
        f.escalate(Severity::Warning, "less bad");
        assert_eq!(f.severity, Severity::Error);
        assert_eq!(f.message, "bad");
    }

    #[test]
    fn escalate_same_level_updates_message() {
        let mut f = Finding::new("test");
        f.escalate(Severity::Warning, "first");
        f.escalate(Severity::Warning, "second");
        assert_eq!(f.message, "second");
    }

    #[test]
    fn registry_adds_services_check_for_root_only() {
        let unprivileged = all_checks(false);
        let privileged = all_checks(true);
        assert_eq!(privileged.len(), unprivileged.len() + 1);
        assert!(privileged.iter().any(|c| c.requires_root()));
        assert!(unprivileged.iter().all(|c| !c.requires_root()));
    }
}
