//! Pre-execution fix validation.
//!
//! Structural checks plus a denylist of known-catastrophic command
//! fragments. This is advisory defense in depth against literal
//! patterns, not a sandbox; it cannot catch semantically equivalent
//! commands reached through indirection.

use super::Fix;
use crate::error::MedicError;

/// Destructive fragments that disqualify a fix outright. Matched by
/// case-insensitive substring containment, not by parsing the command.
const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf /",
    "dd if=",
    "mkfs",
    "fdisk",
    "parted",
    "> /dev/",
];

/// Validate a fix before it is ever shown for confirmation.
///
/// Checks run in order and the first failure wins: title, command list,
/// denylist, reverse-command coverage. Pure and side-effect free.
pub fn validate(fix: &Fix) -> Result<(), MedicError> {
    if fix.title.is_empty() {
        return Err(MedicError::invalid_fix("missing title"));
    }

    if fix.commands.is_empty() {
        return Err(MedicError::invalid_fix("no commands"));
    }

    for command in &fix.commands {
        let lower = command.to_lowercase();
        for pattern in DANGEROUS_PATTERNS {
            if lower.contains(pattern) {
                return Err(MedicError::invalid_fix(format!(
                    "dangerous command detected: {}",
                    command
                )));
            }
        }
    }

    // A reversible fix must be able to unwind any prefix that ran before
    // a failure. The deepest rollback happens when the last command
    // fails, which needs reverse entries for every step but the last.
    if fix.reversible && fix.reverse_commands.len() + 1 < fix.commands.len() {
        return Err(MedicError::invalid_fix(format!(
            "reverse commands do not cover forward steps ({} of {})",
            fix.reverse_commands.len(),
            fix.commands.len()
        )));
    }

    Ok(())
}
