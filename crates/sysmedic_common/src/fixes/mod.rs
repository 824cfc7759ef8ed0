//! Remediation descriptors and their execution machinery.

mod catalog;
mod executor;
mod validate;

pub use catalog::{common_fix, common_fixes};
pub use executor::{
    CommandRunner, Executor, ExecutionOutcome, FixStatus, Prompter, StdinPrompter, SystemRunner,
};
pub use validate::validate;

use serde::{Deserialize, Serialize};

/// Advisory risk label attached to every fix. Ordered so prompt friction
/// can key off "High and above"; never blocks execution by itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Advisory display color for the confirmation prompt.
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "red",
            RiskLevel::Critical => "magenta",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A remediation offered to the operator: an ordered command sequence plus
/// the metadata the confirmation prompt needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    /// Unique within one diagnosis.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Commands executed strictly in order, one subprocess each.
    pub commands: Vec<String>,
    pub requires_root: bool,
    pub reversible: bool,
    /// Reverse command for step i undoes commands[i]. Rollback runs these
    /// in reverse step order.
    #[serde(default)]
    pub reverse_commands: Vec<String>,
    pub risk_level: RiskLevel,
}

impl Fix {
    /// Irreversible fix with no reverse commands - the common case.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        commands: Vec<String>,
        requires_root: bool,
        risk_level: RiskLevel,
    ) -> Self {
        Fix {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            commands,
            requires_root,
            reversible: false,
            reverse_commands: Vec::new(),
            risk_level,
        }
    }

    pub fn reversible(mut self, reverse_commands: Vec<String>) -> Self {
        self.reversible = true;
        self.reverse_commands = reverse_commands;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn risk_level_labels_and_colors_are_total() {
        let expected = [
            (RiskLevel::Low, "Low", "green"),
            (RiskLevel::Medium, "Medium", "yellow"),
            (RiskLevel::High, "High", "red"),
            (RiskLevel::Critical, "Critical", "magenta"),
        ];
        for (level, label, color) in expected {
            assert_eq!(level.label(), label);
            assert_eq!(level.color(), color);
            assert_eq!(level.to_string(), label);
        }
    }

    #[test]
    fn reversible_builder_sets_reverse_commands() {
        let fix = Fix::new(
            "swap_off",
            "Disable Swap",
            "Turn swap off",
            vec!["swapoff -a".to_string()],
            true,
            RiskLevel::Medium,
        )
        .reversible(vec!["swapon -a".to_string()]);

        assert!(fix.reversible);
        assert_eq!(fix.reverse_commands.len(), 1);
    }
}
