//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sbd/sbd.toml`
//! 3. Explicit config: `--config <file>`
//! 4. Environment variables: `SBD_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for sbd.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Pretty-print saved documents
    pub pretty: bool,
    /// Write a timestamped copy before overwriting a bundle
    pub backup: bool,
    /// Where backups go (default: next to the bundle)
    pub backup_dir: Option<PathBuf>,
    /// Bundle file extension, without the dot
    pub extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pretty: true,
            backup: true,
            backup_dir: None,
            extension: "sbd".into(),
        }
    }
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified in this layer, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub pretty: Option<bool>,
    pub backup: Option<bool>,
    pub backup_dir: Option<PathBuf>,
    pub extension: Option<String>,
}

/// Get the XDG config directory for sbd.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sbd").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sbd.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input untouched.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.backup_dir {
            self.backup_dir = Some(PathBuf::from(expand_env_vars(&dir.to_string_lossy())));
        }
        self.extension = self.extension.trim_start_matches('.').to_string();
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            pretty: overlay.pretty.unwrap_or(self.pretty),
            backup: overlay.backup.unwrap_or(self.backup),
            backup_dir: overlay
                .backup_dir
                .clone()
                .or_else(|| self.backup_dir.clone()),
            extension: overlay
                .extension
                .clone()
                .unwrap_or_else(|| self.extension.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given on the command line; it must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply SBD_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        Self::apply_env(settings, env_source())
    }

    fn apply_env(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_bool(&config, "pretty")? {
            settings.pretty = val;
        }
        if let Some(val) = env_bool(&config, "backup")? {
            settings.backup = val;
        }
        if let Ok(val) = config.get_string("backup_dir") {
            settings.backup_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("extension") {
            settings.extension = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# sbd configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/sbd/sbd.toml
#   Explicit: sbd --config <file>
#   Env:      SBD_* environment variables (e.g. SBD_PRETTY=false)

# Pretty-print saved bundles
# pretty = true

# Copy a bundle to <name>.bk-<timestamp>.<ext> before overwriting it
# backup = true

# Directory for backups (default: next to the bundle)
# backup_dir = "~/.local/state/sbd/backups"

# Extension of bundle files picked up by `sbd check <dir>`
# extension = "sbd"
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("SBD")
        .prefix_separator("_")
        .separator("__")
}

/// A boolean override; set but unparseable is an error, not a silent default.
fn env_bool(config: &Config, key: &str) -> Result<Option<bool>, ApplicationError> {
    match config.get_bool(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("SBD_{}: {}", key.to_uppercase(), e),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
