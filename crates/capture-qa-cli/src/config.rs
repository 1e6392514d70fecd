//! Configuration file support for capture-qa.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/capture-qa/config.toml` (lowest priority)
//! - Project-local: `.capture-qa.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use capture_qa_core::{BackendPreference, ReadbackMode};
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Brightness (underexposure) check settings.
    pub brightness: BrightnessConfig,
    /// Blur check settings.
    pub blur: BlurConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Brightness check configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Enable/disable the brightness check.
    pub enabled: Option<bool>,
    /// Mean luma below which an image is dark (0-255).
    pub dark_threshold: Option<f64>,
}

/// Blur check configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Enable/disable the blur check.
    pub enabled: Option<bool>,
    /// Laplacian variance at or below which an image is blurred.
    pub threshold: Option<f64>,
    /// Readback mode: "full" or "legacy".
    pub readback: Option<String>,
    /// Compute backend: "auto", "gpu" or "cpu".
    pub backend: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/capture-qa/config.toml`
    /// 2. Project-local: `.capture-qa.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.brightness.dark_threshold {
            if !(0.0..=255.0).contains(&t) {
                return Err(format!(
                    "brightness.dark_threshold must be 0.0-255.0, got {t}"
                ));
            }
        }
        if let Some(t) = self.blur.threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(format!("blur.threshold must be >= 0, got {t}"));
            }
        }

        if let Some(ref r) = self.blur.readback {
            r.parse::<ReadbackMode>()
                .map_err(|e| format!("blur.readback: {e}"))?;
        }
        if let Some(ref b) = self.blur.backend {
            b.parse::<BackendPreference>()
                .map_err(|e| format!("blur.backend: {e}"))?;
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        // Brightness
        self.brightness.enabled = other.brightness.enabled.or(self.brightness.enabled);
        self.brightness.dark_threshold = other
            .brightness
            .dark_threshold
            .or(self.brightness.dark_threshold);

        // Blur
        self.blur.enabled = other.blur.enabled.or(self.blur.enabled);
        self.blur.threshold = other.blur.threshold.or(self.blur.threshold);
        self.blur.readback = other.blur.readback.or_else(|| self.blur.readback.take());
        self.blur.backend = other.blur.backend.or_else(|| self.blur.backend.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("capture-qa").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.capture-qa.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".capture-qa.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.brightness.dark_threshold.is_none());
        assert!(config.blur.threshold.is_none());
        assert!(config.blur.backend.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.blur.enabled.is_none());
        assert!(config.brightness.enabled.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
recursive = true

[brightness]
enabled = false
dark_threshold = 35.5

[blur]
enabled = true
threshold = 4.0
readback = 'legacy'
backend = 'cpu'

[output]
format = 'json'
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.brightness.enabled, Some(false));
        assert_eq!(config.brightness.dark_threshold, Some(35.5));
        assert_eq!(config.blur.threshold, Some(4.0));
        assert_eq!(config.blur.readback.as_deref(), Some("legacy"));
        assert_eq!(config.blur.backend.as_deref(), Some("cpu"));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.pretty, Some(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[blur]
threshold = 3.0
backend = 'gpu'

[brightness]
dark_threshold = 30.0
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[blur]
threshold = 6.0

[output]
format = 'json'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.blur.threshold, Some(6.0));
        assert_eq!(base.blur.backend.as_deref(), Some("gpu"));
        assert_eq!(base.brightness.dark_threshold, Some(30.0));
        assert_eq!(base.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[brightness]
enabled = false
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.brightness.enabled, Some(false));
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[blur
threshold = 0.5
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[brightness]
dark_threshold = "dim"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_validate_dark_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.brightness.dark_threshold = Some(300.0);

        let result = config.validate();
        assert!(result.unwrap_err().contains("brightness.dark_threshold"));
    }

    #[test]
    fn test_validate_negative_blur_threshold() {
        let mut config = AppConfig::default();
        config.blur.threshold = Some(-1.0);

        let result = config.validate();
        assert!(result.unwrap_err().contains("blur.threshold"));
    }

    #[test]
    fn test_validate_unknown_enums() {
        let mut config = AppConfig::default();
        config.blur.readback = Some("byte".into());
        assert!(config.validate().unwrap_err().contains("blur.readback"));

        let mut config = AppConfig::default();
        config.blur.backend = Some("tpu".into());
        assert!(config.validate().unwrap_err().contains("blur.backend"));

        let mut config = AppConfig::default();
        config.output.format = Some("xml".into());
        assert!(config.validate().unwrap_err().contains("output.format"));
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".capture-qa.toml"), "").unwrap();

        let found = find_config_in_parents(&nested).unwrap();
        assert_eq!(found, dir.path().join(".capture-qa.toml"));
    }
}
