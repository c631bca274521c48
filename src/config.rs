//! Application configuration module.
//!
//! Handles loading, validating, and merging `paveviz.toml`. Stock defaults
//! are serialized to TOML, the user file is merged on top, and the result is
//! deserialized with unknown keys rejected.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [catalog]
//! feed_url = "https://script.google.com/macros/s/…/exec"
//!
//! [generation]
//! api_base = "https://generativelanguage.googleapis.com/v1beta"
//! image_model = "gemini-2.5-flash-image-preview"
//! text_model = "gemini-2.5-flash"
//! api_key_env = "API_KEY"   # Environment variable holding the API key
//!
//! [session]
//! reset_gallery_on_new_photo = true
//!
//! [report]
//! title = "AI Paving Design Report"
//! file_name = "paving-design-report.pdf"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [generation]
//! image_model = "gemini-2.5-flash-image"
//! ```
//!
//! Unknown keys are rejected to catch typos early. The API key itself never
//! lives in the file; only the name of the variable that holds it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "paveviz.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),
}

/// Application configuration loaded from `paveviz.toml`.
///
/// All fields have working defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Product feed location.
    pub catalog: CatalogConfig,
    /// Generation service endpoint and models.
    pub generation: GenerationConfig,
    /// Session behavior.
    pub session: SessionConfig,
    /// PDF report settings.
    pub report: ReportConfig,
}

impl AppConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("catalog.feed_url", &self.catalog.feed_url),
            ("generation.api_base", &self.generation.api_base),
        ] {
            if !(value.starts_with("https://") || value.starts_with("http://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL"
                )));
            }
        }
        for (key, value) in [
            ("generation.image_model", &self.generation.image_model),
            ("generation.text_model", &self.generation.text_model),
            ("generation.api_key_env", &self.generation.api_key_env),
            ("report.file_name", &self.report.file_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Product feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// URL of the spreadsheet-backed product feed.
    pub feed_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://script.google.com/macros/s/AKfycbxzv3n-bAjKxK9B3rF2kt2ZBs029LRiDiRetqaXwmR2ODhziIVisQe-whueFcEOjYRDZw/exec".to_string(),
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// REST base URL, without the `/models/…` suffix.
    pub api_base: String,
    /// Model used for visualization and refinement.
    pub image_model: String,
    /// Model used to summarize refinement instructions.
    pub text_model: String,
    /// Environment variable the API key is read from.
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image-preview".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }
}

/// Session behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Loading a new site photo starts a new project: history and gallery
    /// are cleared. When false they carry over and the report groups
    /// entries per photo.
    pub reset_gallery_on_new_photo: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_gallery_on_new_photo: true,
        }
    }
}

/// PDF report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Heading on the first page.
    pub title: String,
    /// File name used when no output path is given.
    pub file_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "AI Paving Design Report".to_string(),
            file_name: "paving-design-report.pdf".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `path`, merged over stock defaults and validated.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `paveviz.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Paveviz Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Product catalog
# ---------------------------------------------------------------------------
[catalog]
# Spreadsheet-backed feed. GET returns the product list; GET ?fileId=<id>
# returns one full-resolution swatch as a data URL.
feed_url = "https://script.google.com/macros/s/AKfycbxzv3n-bAjKxK9B3rF2kt2ZBs029LRiDiRetqaXwmR2ODhziIVisQe-whueFcEOjYRDZw/exec"

# ---------------------------------------------------------------------------
# Generation service
# ---------------------------------------------------------------------------
[generation]
api_base = "https://generativelanguage.googleapis.com/v1beta"
# Image model: visualizations and refinements.
image_model = "gemini-2.5-flash-image-preview"
# Text model: one-line descriptions of refinements for the report.
text_model = "gemini-2.5-flash"
# Name of the environment variable holding the API key.
api_key_env = "API_KEY"

# ---------------------------------------------------------------------------
# Session
# ---------------------------------------------------------------------------
[session]
# Loading a new site photo clears the history and gallery.
# Set to false to keep results from several photos in one report.
reset_gallery_on_new_photo = true

# ---------------------------------------------------------------------------
# Report
# ---------------------------------------------------------------------------
[report]
title = "AI Paving Design Report"
file_name = "paving-design-report.pdf"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn default_models() {
        let config = AppConfig::default();
        assert_eq!(config.generation.image_model, "gemini-2.5-flash-image-preview");
        assert_eq!(config.generation.text_model, "gemini-2.5-flash");
        assert!(config.session.reset_gallery_on_new_photo);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.report.title, "AI Paving Design Report");
    }

    #[test]
    fn load_config_merges_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[generation]
image_model = "gemini-2.5-flash-image"

[session]
reset_gallery_on_new_photo = false
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.generation.image_model, "gemini-2.5-flash-image");
        // Untouched keys keep their defaults
        assert_eq!(config.generation.text_model, "gemini-2.5-flash");
        assert!(!config.session.reset_gallery_on_new_photo);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[catalog\nfeed_url = ");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[generation]\nimage_modle = \"x\"\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[storage]\npath = \"x\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn validate_rejects_non_url_feed() {
        let mut config = AppConfig::default();
        config.catalog.feed_url = "ftp://feed".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut config = AppConfig::default();
        config.generation.text_model = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("generation.text_model"));
    }

    #[test]
    fn missing_api_key_names_variable() {
        let config = GenerationConfig {
            api_key_env: "PAVEVIZ_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..GenerationConfig::default()
        };
        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("PAVEVIZ_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(5));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(parsed.catalog.feed_url, defaults.catalog.feed_url);
        assert_eq!(parsed.generation.image_model, defaults.generation.image_model);
        assert_eq!(parsed.report.file_name, defaults.report.file_name);
        assert_eq!(
            parsed.session.reset_gallery_on_new_photo,
            defaults.session.reset_gallery_on_new_photo
        );
    }
}
