use crate::input::ToggleKey;
use crate::tile_grid::TileGridSettings;
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "ConsoleConfig::default_toggle_key")]
    pub toggle_key: String,
    #[serde(default)]
    pub open_on_start: bool,
    #[serde(default = "ConsoleConfig::default_shake_to_open")]
    pub shake_to_open: bool,
    /// Compared against the squared acceleration magnitude.
    #[serde(default = "ConsoleConfig::default_shake_acceleration")]
    pub shake_acceleration: f32,
    #[serde(default)]
    pub restrict_log_count: bool,
    #[serde(default = "ConsoleConfig::default_max_log_count")]
    pub max_log_count: usize,
}

impl ConsoleConfig {
    fn default_toggle_key() -> String {
        "`".to_string()
    }

    const fn default_shake_to_open() -> bool {
        true
    }

    const fn default_shake_acceleration() -> f32 {
        3.0
    }

    const fn default_max_log_count() -> usize {
        1_000
    }

    pub fn validate(&self) -> Result<()> {
        ToggleKey::from_config_value(&self.toggle_key)?;
        ensure!(
            self.shake_acceleration.is_finite() && self.shake_acceleration >= 0.0,
            "shake_acceleration must be a non-negative number, got {}",
            self.shake_acceleration
        );
        ensure!(
            !self.restrict_log_count || self.max_log_count > 0,
            "max_log_count must be at least 1 when restrict_log_count is enabled"
        );
        Ok(())
    }

    pub fn log_limit(&self) -> Option<NonZeroUsize> {
        if self.restrict_log_count {
            NonZeroUsize::new(self.max_log_count)
        } else {
            None
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            toggle_key: Self::default_toggle_key(),
            open_on_start: false,
            shake_to_open: Self::default_shake_to_open(),
            shake_acceleration: Self::default_shake_acceleration(),
            restrict_log_count: false,
            max_log_count: Self::default_max_log_count(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "ScanConfig::default_path_separator")]
    pub path_separator: String,
}

impl ScanConfig {
    fn default_path_separator() -> String {
        "/".to_string()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { path_separator: Self::default_path_separator() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub tile_grid: TileGridSettings,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ToolkitConfigOverrides {
    pub max_logs: Option<usize>,
    pub open_on_start: Option<bool>,
    pub shake_to_open: Option<bool>,
}

impl ToolkitConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.validate().with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    /// A path the user named must load; only the implicit `fallback` may fall back to defaults.
    pub fn load_explicit_or_default(explicit: Option<&str>, fallback: impl AsRef<Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default(fallback)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.console.validate().context("console")?;
        self.tile_grid.validate().context("tile_grid")?;
        ensure!(!self.scan.path_separator.is_empty(), "scan.path_separator must not be empty");
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ToolkitConfigOverrides) {
        if let Some(max_logs) = overrides.max_logs {
            self.console.restrict_log_count = true;
            self.console.max_log_count = max_logs;
        }
        if let Some(open) = overrides.open_on_start {
            self.console.open_on_start = open;
        }
        if let Some(shake) = overrides.shake_to_open {
            self.console.shake_to_open = shake;
        }
    }
}

impl ToolkitConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.max_logs.is_none() && self.open_on_start.is_none() && self.shake_to_open.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.max_logs.is_some() {
            fields.push("max_logs");
        }
        if self.open_on_start.is_some() {
            fields.push("open");
        }
        if self.shake_to_open.is_some() {
            fields.push("shake");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut temp = NamedTempFile::new().expect("temp config");
        write!(temp, r#"{{"console":{{"toggle_key":"F2","restrict_log_count":true,"max_log_count":5}}}}"#)
            .expect("write config");
        let cfg = ToolkitConfig::load(temp.path()).expect("load config");
        assert_eq!(cfg.console.toggle_key, "F2");
        assert_eq!(cfg.console.log_limit(), NonZeroUsize::new(5));
        assert!(cfg.console.shake_to_open);
        assert_eq!(cfg.tile_grid.grid_width, 100);
        assert_eq!(cfg.scan.path_separator, "/");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let console = ConsoleConfig { restrict_log_count: true, max_log_count: 0, ..ConsoleConfig::default() };
        assert!(console.validate().is_err());
        let unrestricted = ConsoleConfig { max_log_count: 0, ..ConsoleConfig::default() };
        assert!(unrestricted.validate().is_ok());
        assert_eq!(unrestricted.log_limit(), None);
    }

    #[test]
    fn negative_shake_threshold_is_rejected() {
        let console = ConsoleConfig { shake_acceleration: -1.0, ..ConsoleConfig::default() };
        assert!(console.validate().is_err());
    }

    #[test]
    fn overrides_enable_restriction() {
        let mut cfg = ToolkitConfig::default();
        let overrides = ToolkitConfigOverrides { max_logs: Some(42), open_on_start: Some(true), shake_to_open: None };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.console.log_limit(), NonZeroUsize::new(42));
        assert!(cfg.console.open_on_start);
        assert_eq!(overrides.applied_fields(), vec!["max_logs", "open"]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ToolkitConfig::load_or_default("config/does_not_exist.json");
        assert_eq!(cfg.console.max_log_count, 1_000);
        let cfg = ToolkitConfig::load_explicit_or_default(None, "config/does_not_exist.json").expect("fallback");
        assert_eq!(cfg.console.max_log_count, 1_000);
    }

    #[test]
    fn explicit_invalid_file_is_an_error() {
        let mut temp = NamedTempFile::new().expect("temp config");
        write!(temp, r#"{{"console":{{"restrict_log_count":true,"max_log_count":0}}}}"#).expect("write config");
        let path = temp.path().to_str().expect("utf-8 temp path");
        let err = ToolkitConfig::load_explicit_or_default(Some(path), "config/does_not_exist.json")
            .expect_err("an explicit bad file must not fall back");
        assert!(format!("{err:?}").contains("max_log_count"), "error should name the bad field: {err:?}");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(ToolkitConfig::load_explicit_or_default(Some("config/does_not_exist.json"), "unused").is_err());
    }
}
