//! Package system diagnosis.

use super::Diagnosis;
use crate::checks::package_facts;
use crate::fixes::{common_fix, Fix, RiskLevel};
use crate::probe::{probe, probe_lenient};

pub fn diagnose_package_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Package System Issues");

    let broken = package_facts::broken_packages();
    if !broken.is_empty() {
        diagnosis.finding(format!("Broken packages detected: {}", broken.len()));
        for (i, pkg) in broken.iter().enumerate() {
            if i >= 5 {
                diagnosis.finding(format!("  ... and {} more", broken.len() - 5));
                break;
            }
            diagnosis.finding(format!("  - {}", pkg));
        }

        if let Some(fix) = common_fix("fix_broken_packages") {
            diagnosis.fix(fix);
        }

        diagnosis.fix(Fix::new(
            "dpkg_configure_all",
            "Configure All Packages",
            "Configure all unpacked but unconfigured packages",
            vec!["dpkg --configure -a".to_string()],
            true,
            RiskLevel::Medium,
        ));
    }

    let dependency_issues = dependency_issues();
    if !dependency_issues.is_empty() {
        diagnosis.finding("Dependency issues found:");
        for issue in &dependency_issues {
            diagnosis.finding(format!("  - {}", issue));
        }

        diagnosis.fix(Fix::new(
            "fix_dependencies",
            "Fix Missing Dependencies",
            "Install missing dependencies and fix broken dependencies",
            vec!["apt-get -f install".to_string()],
            true,
            RiskLevel::Medium,
        ));
    }

    if apt_locked() {
        diagnosis.finding("APT is currently locked (another package operation in progress)");

        diagnosis.fix(Fix::new(
            "show_apt_processes",
            "Show Running APT Processes",
            "Display processes that may be using APT/dpkg",
            vec!["fuser -v /var/lib/dpkg/lock-frontend".to_string()],
            false,
            RiskLevel::Low,
        ));

        diagnosis.fix(Fix::new(
            "remove_apt_lock",
            "Remove APT Lock Files (DANGEROUS)",
            "Force remove APT lock files - only use if no APT processes are running",
            vec![
                "rm -f /var/lib/dpkg/lock-frontend".to_string(),
                "rm -f /var/lib/dpkg/lock".to_string(),
                "rm -f /var/cache/apt/archives/lock".to_string(),
            ],
            true,
            RiskLevel::High,
        ));
    }

    if let Some(cache_mb) = package_facts::package_cache_size_mb() {
        if cache_mb > 1000.0 {
            diagnosis.finding(format!("Large package cache detected: {:.1} MB", cache_mb));
            if let Some(fix) = common_fix("clean_package_cache") {
                diagnosis.fix(fix);
            }
        }
    }

    let upgradable = package_facts::upgradable_count();
    if upgradable > 20 {
        diagnosis.finding(format!(
            "Many packages available for upgrade: {}",
            upgradable
        ));

        diagnosis.fix(Fix::new(
            "upgrade_packages",
            "Upgrade All Packages",
            "Upgrade all packages to their latest versions",
            vec![
                "apt-get update".to_string(),
                "apt-get upgrade -y".to_string(),
            ],
            true,
            RiskLevel::Medium,
        ));

        diagnosis.fix(Fix::new(
            "list_upgradable",
            "List Upgradable Packages",
            "Show which packages can be upgraded",
            vec!["apt list --upgradable".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    let orphaned = package_facts::autoremovable_count();
    if orphaned > 10 {
        diagnosis.finding(format!("Many orphaned packages detected: {}", orphaned));

        if let Some(fix) = common_fix("remove_orphaned_packages") {
            diagnosis.fix(fix);
        }

        diagnosis.fix(Fix::new(
            "list_orphaned",
            "List Orphaned Packages",
            "Show packages that can be automatically removed",
            vec!["apt-get autoremove --dry-run".to_string()],
            false,
            RiskLevel::Low,
        ));
    }

    if !dpkg_audit_clean() {
        diagnosis.finding("dpkg audit reported packages needing attention");
        diagnosis.fix(Fix::new(
            "reconfigure_packages",
            "Reconfigure Packages",
            "Reconfigure packages that failed configuration",
            vec!["dpkg-reconfigure -a".to_string()],
            true,
            RiskLevel::Medium,
        ));
    }

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No significant package system issues detected");
    }

    diagnosis.fix(Fix::new(
        "packages_overview",
        "Comprehensive Package Check",
        "Run comprehensive package system diagnostics",
        vec![
            "apt-get check".to_string(),
            "dpkg --audit".to_string(),
            "apt list --upgradable".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

fn dependency_issues() -> Vec<String> {
    let Some(output) = probe_lenient("apt-get", &["check"]) else {
        return Vec::new();
    };

    // apt-get check is quiet on success; anything beyond the list-reading
    // banner indicates unmet dependencies.
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Reading package lists")
                && !line.starts_with("Building dependency tree")
                && !line.starts_with("Reading state information")
        })
        .map(|line| line.to_string())
        .collect()
}

fn apt_locked() -> bool {
    // fuser exits zero when some process holds the lock file.
    crate::probe::probe_ok("fuser", &["/var/lib/dpkg/lock-frontend"])
}

fn dpkg_audit_clean() -> bool {
    match probe("dpkg", &["--audit"]) {
        Some(output) => output.trim().is_empty(),
        None => true,
    }
}
