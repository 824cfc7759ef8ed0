//! Shared fix descriptors used by several diagnosis categories.
//!
//! Every descriptor here must pass [`super::validate`] - the catalog is
//! the first thing the validator's denylist is checked against in tests.

use super::{Fix, RiskLevel};

/// The commonly used fixes, in stable order.
pub fn common_fixes() -> Vec<Fix> {
    vec![
        Fix::new(
            "update_package_cache",
            "Update Package Cache",
            "Updates the APT package cache to refresh available package information",
            vec!["apt-get update".to_string()],
            true,
            RiskLevel::Low,
        ),
        Fix::new(
            "clean_package_cache",
            "Clean Package Cache",
            "Removes cached package files to free disk space",
            vec!["apt-get clean".to_string(), "apt-get autoclean".to_string()],
            true,
            RiskLevel::Low,
        ),
        Fix::new(
            "remove_orphaned_packages",
            "Remove Orphaned Packages",
            "Removes packages that were automatically installed but are no longer needed",
            vec!["apt-get autoremove -y".to_string()],
            true,
            RiskLevel::Medium,
        ),
        Fix::new(
            "restart_networking",
            "Restart Network Service",
            "Restarts the networking service to resolve connection issues",
            vec!["systemctl restart networking".to_string()],
            true,
            RiskLevel::Medium,
        )
        .reversible(vec!["systemctl start networking".to_string()]),
        Fix::new(
            "flush_dns",
            "Flush DNS Cache",
            "Clears the DNS resolver cache to fix name resolution issues",
            vec!["systemctl restart systemd-resolved".to_string()],
            true,
            RiskLevel::Low,
        )
        .reversible(vec!["systemctl start systemd-resolved".to_string()]),
        Fix::new(
            "fix_broken_packages",
            "Fix Broken Packages",
            "Attempts to fix broken package dependencies",
            vec![
                "apt-get -f install".to_string(),
                "dpkg --configure -a".to_string(),
            ],
            true,
            RiskLevel::Medium,
        ),
        Fix::new(
            "create_swap_file",
            "Create Swap File (1GB)",
            "Creates and activates a 1GB swap file to relieve memory pressure \
             (active until reboot; add an fstab entry to make it permanent)",
            vec![
                "fallocate -l 1G /swapfile".to_string(),
                "chmod 600 /swapfile".to_string(),
                "mkswap /swapfile".to_string(),
                "swapon /swapfile".to_string(),
            ],
            true,
            RiskLevel::Medium,
        )
        .reversible(vec![
            "rm -f /swapfile".to_string(),
            "rm -f /swapfile".to_string(),
            "rm -f /swapfile".to_string(),
            "swapoff /swapfile".to_string(),
        ]),
    ]
}

/// Look up one common fix by id.
pub fn common_fix(id: &str) -> Option<Fix> {
    common_fixes().into_iter().find(|fix| fix.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixes::validate;
    use std::collections::HashSet;

    #[test]
    fn all_common_fixes_pass_validation() {
        for fix in common_fixes() {
            assert!(
                validate(&fix).is_ok(),
                "common fix '{}' failed validation",
                fix.id
            );
        }
    }

    #[test]
    fn common_fix_ids_are_unique() {
        let fixes = common_fixes();
        let ids: HashSet<&str> = fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), fixes.len());
    }

    #[test]
    fn expected_fixes_are_present_and_complete() {
        let expected = [
            "update_package_cache",
            "clean_package_cache",
            "remove_orphaned_packages",
            "restart_networking",
            "flush_dns",
            "fix_broken_packages",
            "create_swap_file",
        ];
        for id in expected {
            let fix = common_fix(id).unwrap_or_else(|| panic!("missing common fix '{}'", id));
            assert_eq!(fix.id, id);
            assert!(!fix.title.is_empty());
            assert!(!fix.description.is_empty());
            assert!(!fix.commands.is_empty());
        }
    }

    #[test]
    fn unknown_id_yields_none() {
        assert!(common_fix("definitely_not_a_fix").is_none());
    }

    #[test]
    fn reversible_common_fixes_cover_their_steps() {
        for fix in common_fixes() {
            if fix.reversible {
                assert!(
                    fix.reverse_commands.len() + 1 >= fix.commands.len(),
                    "fix '{}' cannot unwind every prefix",
                    fix.id
                );
            }
        }
    }
}
