//! Runtime configuration for sysmedic.
//!
//! Configuration is resolved once at startup: the privilege context from
//! the effective uid, the log directory from the user's home (with a /tmp
//! fallback when no home is available), and optional overrides from
//! ~/.sysmedic/config.toml.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.toml";

/// Optional on-disk settings. Missing file or missing keys fall back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSettings {
    /// Override for the log directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Default verbosity when the flag is not given.
    #[serde(default)]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for session log files.
    pub log_dir: PathBuf,

    /// Whether the effective user is root. Determined once at startup and
    /// consumed read-only by the fix executor's permission gate.
    pub is_root: bool,

    pub verbose: bool,

    /// Skip confirmation prompts. Callers running unattended are expected
    /// to filter fixes by risk level themselves.
    pub non_interactive: bool,
}

impl Config {
    pub fn new() -> Self {
        let base = Self::base_dir();
        let mut config = Config {
            log_dir: base.join("logs"),
            is_root: nix::unistd::Uid::effective().is_root(),
            verbose: false,
            non_interactive: false,
        };

        if let Some(settings) = Self::load_settings(&base) {
            if let Some(dir) = settings.log_dir {
                config.log_dir = dir;
            }
            if let Some(verbose) = settings.verbose {
                config.verbose = verbose;
            }
        }

        config
    }

    /// ~/.sysmedic, or a /tmp location when no home directory exists
    /// (e.g. stripped-down containers).
    fn base_dir() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".sysmedic"),
            None => PathBuf::from("/tmp/sysmedic"),
        }
    }

    fn load_settings(base: &std::path::Path) -> Option<FileSettings> {
        let raw = std::fs::read_to_string(base.join(CONFIG_FILE)).ok()?;
        match toml::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("ignoring malformed config file: {}", e);
                None
            }
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_non_interactive(&mut self, non_interactive: bool) {
        self.non_interactive = non_interactive;
    }

    pub fn set_log_dir(&mut self, log_dir: PathBuf) {
        self.log_dir = log_dir;
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
