//! One-shot system probes.
//!
//! Diagnosis handlers gather cheap facts by shelling out to the usual
//! admin tooling. A probe that cannot run (missing binary, restricted
//! environment, non-zero exit) yields `None` and is treated as "no
//! finding" - the catalog must stay usable on hosts where half the
//! tooling is absent.

use std::process::Command;

/// Run a command and return its stdout on success.
///
/// Any failure - spawn error or non-zero exit - is logged at debug level
/// and swallowed.
pub fn probe(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!(
                "probe '{} {}' exited {}",
                program,
                args.join(" "),
                output.status.code().unwrap_or(-1)
            );
            None
        }
        Err(e) => {
            tracing::debug!("probe '{}' unavailable: {}", program, e);
            None
        }
    }
}

/// Like [`probe`], but returns combined stdout+stderr regardless of exit
/// status. Some tools (apt-get check, findmnt --verify) report their
/// findings on stderr with a non-zero exit.
pub fn probe_lenient(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            Some(combined)
        }
        Err(e) => {
            tracing::debug!("probe '{}' unavailable: {}", program, e);
            None
        }
    }
}

/// Whether the probe succeeded (exit 0). Missing tooling counts as false.
pub fn probe_ok(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_captures_stdout() {
        let out = probe("echo", &["sysmedic"]).expect("echo should run");
        assert_eq!(out.trim(), "sysmedic");
    }

    #[test]
    fn probe_missing_binary_is_none() {
        assert!(probe("sysmedic-no-such-tool", &[]).is_none());
    }

    #[test]
    fn probe_nonzero_exit_is_none() {
        assert!(probe("false", &[]).is_none());
    }

    #[test]
    fn probe_ok_reflects_exit_status() {
        assert!(probe_ok("true", &[]));
        assert!(!probe_ok("false", &[]));
        assert!(!probe_ok("sysmedic-no-such-tool", &[]));
    }
}
