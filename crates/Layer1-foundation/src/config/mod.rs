//! Config - panel configuration
//!
//! Lookup order for the file: explicit path, `./twirtee.toml`,
//! `<config_dir>/twirtee/config.toml`, then built-in defaults.
//! Environment variables (`APP_TITLE`, `VERSION`, `PHASE`, `THEME`, `DEBUG`)
//! override whatever the file says.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Config file name in the working directory
pub const LOCAL_CONFIG_FILE: &str = "twirtee.toml";

/// Config file name inside the user config directory
pub const USER_CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Enums
// ============================================================================

/// Deployment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    #[default]
    Dev,
    Prod,
    Test,
}

impl std::str::FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEV" => Ok(Phase::Dev),
            "PROD" => Ok(Phase::Prod),
            "TEST" => Ok(Phase::Test),
            other => Err(Error::Config(format!("unknown phase '{}'", other))),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Dev => "DEV",
            Phase::Prod => "PROD",
            Phase::Test => "TEST",
        })
    }
}

/// TUI color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for ThemeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeName::Dark),
            "light" => Ok(ThemeName::Light),
            other => Err(Error::Config(format!("unknown theme '{}'", other))),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Console / output channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Consumer wait bound in milliseconds
    pub poll_interval_ms: u64,

    /// Rendered lines kept by the console buffer
    pub max_lines: usize,

    /// Mirror console text to the real stdout (headless mode)
    pub mirror_stdout: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_lines: 2000,
            mirror_stdout: true,
        }
    }
}

impl ConsoleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Task supervisor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Seconds a task may stay `Stopping` before it is flagged overdue
    pub stop_grace_secs: u64,

    /// Seconds shutdown waits for workers to return
    pub shutdown_grace_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            stop_grace_secs: 10,
            shutdown_grace_secs: 2,
        }
    }
}

impl TasksConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Feature settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Directory for files produced by features
    pub output_dir: PathBuf,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("share/screen_shots"),
        }
    }
}

// ============================================================================
// PanelConfig
// ============================================================================

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub app_title: String,
    pub version: String,
    pub phase: Phase,
    pub theme: ThemeName,
    pub debug: bool,
    pub console: ConsoleConfig,
    pub tasks: TasksConfig,
    pub features: FeaturesConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            app_title: "TwirTee".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            phase: Phase::default(),
            theme: ThemeName::default(),
            debug: false,
            console: ConsoleConfig::default(),
            tasks: TasksConfig::default(),
            features: FeaturesConfig::default(),
        }
    }
}

impl PanelConfig {
    // ========================================================================
    // Load
    // ========================================================================

    /// Load from the first config file found, then apply env overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::search_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Candidate config files, highest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("twirtee").join(USER_CONFIG_FILE));
        }
        paths
    }

    /// Apply overrides from a variable lookup; invalid values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(title) = lookup("APP_TITLE") {
            self.app_title = title;
        }
        if let Some(version) = lookup("VERSION") {
            self.version = version;
        }
        if let Some(phase) = lookup("PHASE") {
            match phase.parse() {
                Ok(phase) => self.phase = phase,
                Err(e) => warn!("Ignoring PHASE override: {}", e),
            }
        }
        if let Some(theme) = lookup("THEME") {
            match theme.parse() {
                Ok(theme) => self.theme = theme,
                Err(e) => warn!("Ignoring THEME override: {}", e),
            }
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = debug.trim().eq_ignore_ascii_case("true");
        }
    }

    /// Window / header title
    pub fn title(&self) -> String {
        format!("{} v{}", self.app_title, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.app_title, "TwirTee");
        assert_eq!(config.phase, Phase::Dev);
        assert_eq!(config.theme, ThemeName::Dark);
        assert_eq!(config.console.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.features.output_dir, PathBuf::from("share/screen_shots"));
    }

    #[test]
    fn test_partial_toml() {
        let config = PanelConfig::from_toml(
            r#"
            app_title = "Ops Panel"
            theme = "light"

            [console]
            max_lines = 50

            [tasks]
            stop_grace_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.app_title, "Ops Panel");
        assert_eq!(config.theme, ThemeName::Light);
        assert_eq!(config.console.max_lines, 50);
        assert_eq!(config.console.poll_interval_ms, 100);
        assert_eq!(config.tasks.stop_grace(), Duration::from_secs(3));
        assert_eq!(config.tasks.shutdown_grace_secs, 2);
    }

    #[test]
    fn test_bad_toml() {
        let err = PanelConfig::from_toml("theme = 42").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("APP_TITLE", "Night Shift"),
            ("PHASE", "prod"),
            ("THEME", "purple"),
            ("DEBUG", "True"),
        ]
        .into_iter()
        .collect();

        let mut config = PanelConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.app_title, "Night Shift");
        assert_eq!(config.phase, Phase::Prod);
        // invalid theme keeps the previous value
        assert_eq!(config.theme, ThemeName::Dark);
        assert!(config.debug);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(&path, "version = \"9.9.9\"\n").unwrap();

        let config = PanelConfig::from_file(&path).unwrap();
        assert_eq!(config.version, "9.9.9");
        assert_eq!(config.title(), "TwirTee v9.9.9");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = PanelConfig::from_file(Path::new("/nonexistent/twirtee.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
