//! Issue diagnosis: category handlers that probe the system and bundle
//! findings with candidate fixes.
//!
//! Within one diagnosis, fixes appear in the order their problems were
//! detected, with the category's overview fix always last. A probe that
//! cannot run contributes no finding; every handler still returns a
//! usable diagnosis on a restricted host.

mod boot;
mod custom;
mod disk;
mod filesystem;
mod logs;
mod network;
mod packages;
mod performance;
mod permissions;
mod services;

pub use custom::{diagnose_custom_issue, troubleshooting_suggestions, Category};
pub use permissions::diagnose_file_permissions;

use crate::fixes::Fix;
use serde::{Deserialize, Serialize};

/// The bundle produced for one symptom category or free-text query.
/// Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub issue: String,
    pub findings: Vec<String>,
    pub fixes: Vec<Fix>,
}

impl Diagnosis {
    fn new(issue: impl Into<String>) -> Self {
        Diagnosis {
            issue: issue.into(),
            findings: Vec::new(),
            fixes: Vec::new(),
        }
    }

    fn finding(&mut self, text: impl Into<String>) {
        self.findings.push(text.into());
    }

    fn fix(&mut self, fix: Fix) {
        self.fixes.push(fix);
    }
}

/// Structured symptom categories offered by the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Boot,
    Network,
    Disk,
    Services,
    Packages,
    Permissions,
    Filesystem,
    Performance,
    Logs,
}

impl IssueCategory {
    pub fn all() -> &'static [IssueCategory] {
        &[
            IssueCategory::Boot,
            IssueCategory::Network,
            IssueCategory::Disk,
            IssueCategory::Services,
            IssueCategory::Packages,
            IssueCategory::Permissions,
            IssueCategory::Filesystem,
            IssueCategory::Performance,
            IssueCategory::Logs,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::Boot => "Boot Issues",
            IssueCategory::Network => "Network Issues",
            IssueCategory::Disk => "Disk Issues",
            IssueCategory::Services => "Service Issues",
            IssueCategory::Packages => "Package System Issues",
            IssueCategory::Permissions => "Permission Issues",
            IssueCategory::Filesystem => "Filesystem Issues",
            IssueCategory::Performance => "Performance Issues",
            IssueCategory::Logs => "System Log Issues",
        }
    }
}

/// Run the handler for one structured category.
pub fn diagnose(category: IssueCategory) -> Diagnosis {
    match category {
        IssueCategory::Boot => boot::diagnose_boot_issues(),
        IssueCategory::Network => network::diagnose_network_issues(),
        IssueCategory::Disk => disk::diagnose_disk_issues(),
        IssueCategory::Services => services::diagnose_service_issues(),
        IssueCategory::Packages => packages::diagnose_package_issues(),
        IssueCategory::Permissions => permissions::diagnose_permission_issues(),
        IssueCategory::Filesystem => filesystem::diagnose_filesystem_issues(),
        IssueCategory::Performance => performance::diagnose_performance_issues(),
        IssueCategory::Logs => logs::diagnose_log_issues(),
    }
}
