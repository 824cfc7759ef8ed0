//! Permission diagnosis: the current user's privileges plus the
//! permission hygiene of home, SSH and sensitive system files.

use super::Diagnosis;
use crate::fixes::{Fix, RiskLevel};
use crate::probe::probe;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

pub fn diagnose_permission_issues() -> Diagnosis {
    let mut diagnosis = Diagnosis::new("Permission Issues");

    check_user_context(&mut diagnosis);
    check_home_directory(&mut diagnosis);
    check_ssh_directory(&mut diagnosis);
    check_sensitive_files(&mut diagnosis);

    if diagnosis.findings.is_empty() {
        diagnosis.finding("No permission issues detected");
    }

    diagnosis.fix(Fix::new(
        "permissions_overview",
        "Permissions Overview",
        "Display the current user's identity, groups and sudo rights",
        vec![
            "id".to_string(),
            "groups".to_string(),
            "sudo -l".to_string(),
        ],
        false,
        RiskLevel::Low,
    ));

    diagnosis
}

/// Analyze one path in depth, the way the interactive "check a file"
/// flow uses it.
pub fn diagnose_file_permissions(path: &str) -> Diagnosis {
    let mut diagnosis = Diagnosis::new(format!("File Permission Analysis: {}", path));

    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            diagnosis.finding(format!("Path does not exist: {}", path));
            append_overview(&mut diagnosis, path);
            return diagnosis;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            diagnosis.finding(format!("Permission denied accessing: {}", path));
            diagnosis.fix(Fix::new(
                "fix_access_permission",
                "Fix Access Permission",
                format!("Add read permission to access {}", path),
                vec![format!("chmod +r {}", path)],
                true,
                RiskLevel::Medium,
            ));
            append_overview(&mut diagnosis, path);
            return diagnosis;
        }
        Err(e) => {
            diagnosis.finding(format!("Error accessing path: {}", e));
            append_overview(&mut diagnosis, path);
            return diagnosis;
        }
    };

    let mode = meta.mode() & 0o7777;
    diagnosis.finding(format!("Path: {}", path));
    diagnosis.finding(format!(
        "Type: {}",
        if meta.is_dir() { "Directory" } else { "File" }
    ));
    diagnosis.finding(format!("Permissions: {:04o}", mode));
    diagnosis.finding(format!("Owner: uid {} / gid {}", meta.uid(), meta.gid()));

    if mode & 0o002 != 0 {
        diagnosis.finding("SECURITY: world-writable");
        diagnosis.fix(
            Fix::new(
                "fix_world_writable",
                "Remove World-Writable Permission",
                "Remove the world-writable bit",
                vec![format!("chmod o-w {}", path)],
                false,
                RiskLevel::Low,
            )
            .reversible(vec![format!("chmod o+w {}", path)]),
        );
    }

    if mode & 0o4000 != 0 {
        diagnosis.finding("SECURITY: setuid bit is set (runs with owner privileges)");
        diagnosis.fix(
            Fix::new(
                "remove_setuid",
                "Remove Setuid Bit",
                "Remove the setuid bit",
                vec![format!("chmod u-s {}", path)],
                true,
                RiskLevel::High,
            )
            .reversible(vec![format!("chmod u+s {}", path)]),
        );
    }

    if meta.is_dir() && mode & 0o111 == 0 {
        diagnosis.finding("Directory is not accessible (no execute permission)");
        diagnosis.fix(Fix::new(
            "fix_dir_access",
            "Make Directory Accessible",
            "Add execute permission to access the directory",
            vec![format!("chmod +x {}", path)],
            false,
            RiskLevel::Low,
        ));
    }

    append_overview(&mut diagnosis, path);
    diagnosis
}

fn append_overview(diagnosis: &mut Diagnosis, path: &str) {
    diagnosis.fix(Fix::new(
        "file_permissions_overview",
        "File Permissions Overview",
        "Show detailed ownership and permission information",
        vec![format!("ls -la {}", path), format!("stat {}", path)],
        false,
        RiskLevel::Low,
    ));
}

fn check_user_context(diagnosis: &mut Diagnosis) {
    if let Some(id) = probe("id", &[]) {
        diagnosis.finding(format!("Current user: {}", id.trim()));
    }

    if let Some(groups) = probe("groups", &[]) {
        let groups = groups.trim().to_string();
        let admin_groups = ["sudo", "admin", "wheel"];
        if !admin_groups
            .iter()
            .any(|g| groups.split_whitespace().any(|have| have == *g))
        {
            diagnosis.finding("User is not in sudo/admin group");
        }
    }
}

fn check_home_directory(diagnosis: &mut Diagnosis) {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let Ok(meta) = fs::metadata(&home) else {
        return;
    };

    let mode = meta.mode() & 0o777;
    if mode & 0o077 != 0 {
        diagnosis.finding(format!(
            "Home directory has overly permissive permissions: {:03o}",
            mode
        ));
        diagnosis.fix(Fix::new(
            "fix_home_permissions",
            "Fix Home Directory Permissions",
            "Set secure permissions on home directory",
            vec![format!("chmod 750 {}", home.display())],
            false,
            RiskLevel::Low,
        ));
    }
}

fn check_ssh_directory(diagnosis: &mut Diagnosis) {
    let Some(ssh_dir) = dirs::home_dir().map(|h| h.join(".ssh")) else {
        return;
    };
    let Ok(meta) = fs::metadata(&ssh_dir) else {
        return;
    };

    let mode = meta.mode() & 0o777;
    if mode != 0o700 {
        diagnosis.finding(format!(
            ".ssh directory has incorrect permissions: {:03o} (should be 700)",
            mode
        ));
        diagnosis.fix(Fix::new(
            "fix_ssh_dir_permissions",
            "Fix SSH Directory Permissions",
            "Set correct permissions on the .ssh directory and private keys",
            vec![format!("chmod 700 {}", ssh_dir.display())],
            false,
            RiskLevel::Low,
        ));
    }

    for key in ["id_rsa", "id_ed25519"] {
        let path: PathBuf = ssh_dir.join(key);
        if let Ok(meta) = fs::metadata(&path) {
            let mode = meta.mode() & 0o777;
            if mode != 0o600 {
                diagnosis.finding(format!(
                    "SSH private key {} has insecure permissions: {:03o} (should be 600)",
                    key, mode
                ));
                diagnosis.fix(Fix::new(
                    format!("fix_key_permissions_{}", key),
                    format!("Fix Permissions on {}", key),
                    "Restrict the private key to its owner",
                    vec![format!("chmod 600 {}", path.display())],
                    false,
                    RiskLevel::Low,
                ));
            }
        }
    }
}

fn check_sensitive_files(diagnosis: &mut Diagnosis) {
    let sensitive: &[(&str, u32)] = &[
        ("/etc/passwd", 0o644),
        ("/etc/shadow", 0o640),
        ("/etc/sudoers", 0o440),
    ];

    for (file, _expected) in sensitive {
        if let Ok(meta) = fs::metadata(Path::new(file)) {
            let mode = meta.mode() & 0o777;
            if mode & 0o007 != 0 {
                diagnosis.finding(format!(
                    "{} is world-accessible: {:03o}",
                    file, mode
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn permissions_diagnosis_ends_with_overview() {
        let diagnosis = diagnose_permission_issues();
        assert_eq!(diagnosis.fixes.last().unwrap().id, "permissions_overview");
        assert!(!diagnosis.findings.is_empty());
    }

    #[test]
    fn missing_path_is_reported_not_panicked() {
        let diagnosis = diagnose_file_permissions("/no/such/path/sysmedic");
        assert!(diagnosis
            .findings
            .iter()
            .any(|f| f.contains("does not exist")));
        assert_eq!(
            diagnosis.fixes.last().unwrap().id,
            "file_permissions_overview"
        );
    }

    #[test]
    fn world_writable_file_gets_reversible_fix() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("open.txt");
        std::fs::write(&file, "x").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o666)).unwrap();

        let diagnosis = diagnose_file_permissions(file.to_str().unwrap());
        let fix = diagnosis
            .fixes
            .iter()
            .find(|f| f.id == "fix_world_writable")
            .expect("world-writable fix offered");
        assert!(fix.reversible);
        assert_eq!(fix.commands.len(), fix.reverse_commands.len());
    }

    #[test]
    fn file_diagnosis_fix_ids_are_distinct() {
        let diagnosis = diagnose_file_permissions("/etc/passwd");
        let ids: HashSet<&str> = diagnosis.fixes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids.len(), diagnosis.fixes.len());
    }
}
