//! Sysmedic Common - diagnosis and remediation core for the sysmedic CLI.
//!
//! Everything stateful lives here: the check/finding model, the category
//! diagnosis catalog, fix validation and the guarded fix executor. The
//! binary crate only adds the menu surface on top.

pub mod checks;
pub mod config;
pub mod diagnose;
pub mod error;
pub mod fixes;
pub mod probe;
pub mod report;

pub use config::Config;
pub use error::MedicError;
