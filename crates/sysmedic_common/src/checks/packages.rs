//! APT/dpkg package system check.

use super::{Check, Finding, Severity};
use crate::probe::{probe, probe_lenient};

pub struct PackagesCheck;

impl Check for PackagesCheck {
    fn name(&self) -> &'static str {
        "Package System"
    }

    fn requires_root(&self) -> bool {
        false
    }

    fn run(&self) -> Finding {
        let mut finding = Finding::new(self.name());
        finding.message = "Package system analysis completed".to_string();

        let broken = broken_packages();
        if !broken.is_empty() {
            finding.escalate(Severity::Error, "Broken packages detected");
            finding.detail(format!("Broken packages found: {}", broken.len()));
            for (i, pkg) in broken.iter().enumerate() {
                if i >= 5 {
                    finding.detail(format!("... and {} more", broken.len() - 5));
                    break;
                }
                finding.detail(format!("  - {}", pkg));
            }
        }

        let held = held_packages();
        if !held.is_empty() {
            finding.escalate(Severity::Warning, "Held packages detected");
            finding.detail(format!("Held packages: {}", held.len()));
            for (i, pkg) in held.iter().enumerate() {
                if i >= 3 {
                    finding.detail(format!("... and {} more", held.len() - 3));
                    break;
                }
                finding.detail(format!("  - {}", pkg));
            }
        }

        let upgradable = upgradable_count();
        if upgradable > 0 {
            finding.detail(format!("Packages available for upgrade: {}", upgradable));
            if upgradable > 50 {
                finding.escalate(Severity::Warning, "Many packages need upgrading");
            }
        }

        let autoremovable = autoremovable_count();
        if autoremovable > 0 {
            finding.detail(format!("Autoremovable packages: {}", autoremovable));
            if autoremovable > 20 {
                finding.escalate(Severity::Warning, "Many orphaned packages detected");
            }
        }

        if dpkg_interrupted() {
            finding.escalate(Severity::Error, "Package installation was interrupted");
            finding.detail(
                "dpkg was interrupted - packages may be in inconsistent state".to_string(),
            );
        }

        if let Some(size_mb) = package_cache_size_mb() {
            if size_mb > 1000.0 {
                finding.escalate(Severity::Warning, "Large package cache detected");
                finding.detail(format!("Package cache size: {:.1} MB", size_mb));
            }
        }

        if finding.severity == Severity::Info {
            finding.detail("Package system appears healthy".to_string());
        }

        finding
    }
}

/// Packages in a half-installed or failed-config dpkg state.
pub(crate) fn broken_packages() -> Vec<String> {
    let Some(output) = probe("dpkg", &["-l"]) else {
        return Vec::new();
    };

    let mut broken: Vec<String> = output
        .lines()
        .filter(|line| line.starts_with("iU") || line.starts_with("iF"))
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|pkg| pkg.to_string())
        .collect();
    broken.dedup();
    broken
}

fn held_packages() -> Vec<String> {
    let Some(output) = probe("apt-mark", &["showhold"]) else {
        return Vec::new();
    };
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

pub(crate) fn upgradable_count() -> usize {
    let Some(output) = probe("apt", &["list", "--upgradable"]) else {
        return 0;
    };
    output
        .lines()
        .filter(|line| line.contains("[upgradable from:"))
        .count()
}

pub(crate) fn autoremovable_count() -> usize {
    let Some(output) = probe_lenient("apt-get", &["autoremove", "--dry-run"]) else {
        return 0;
    };
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("Remv "))
        .count()
}

fn dpkg_interrupted() -> bool {
    // dpkg leaves journal entries in updates/ while an operation is in
    // flight; anything but log files means an interrupted run.
    match std::fs::read_dir("/var/lib/dpkg/updates") {
        Ok(entries) => entries
            .flatten()
            .any(|e| e.file_name().to_string_lossy().chars().all(|c| c.is_ascii_digit())),
        Err(_) => false,
    }
}

pub(crate) fn package_cache_size_mb() -> Option<f64> {
    let output = probe("du", &["-sm", "/var/cache/apt/archives"])?;
    output
        .split_whitespace()
        .next()
        .and_then(|size| size.parse().ok())
}
