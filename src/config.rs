//! Configuration loader and validator for the sensor scanner.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::display::Language;
use crate::formats::BarcodeFormat;
use crate::scanner::{ScanRequest, ScanningMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub store: Store,
    #[serde(default)]
    pub scanner: Scanner,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default)]
    pub language: Language,
    /// Status code written for every scanned sensor.
    #[serde(default = "default_used_status")]
    pub used_status: i64,
}

/// Realtime database settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    pub sensors_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Scanner defaults, overridable on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scanner {
    #[serde(default)]
    pub mode: ScanningMode,
    #[serde(default)]
    pub formats: Vec<BarcodeFormat>,
}

fn default_used_status() -> i64 {
    1
}

fn default_request_timeout() -> u64 {
    30
}

impl Scanner {
    pub fn request(&self) -> ScanRequest {
        ScanRequest::new(self.mode, self.formats.clone())
    }
}

impl Store {
    /// Auth token with blank values treated as absent.
    pub fn auth(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let url = cfg.store.database_url.trim();
    if url.is_empty() {
        return Err(ConfigError::Invalid("store.database_url must be non-empty"));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ConfigError::Invalid(
            "store.database_url must be an http(s) URL",
        ));
    }
    if cfg.store.sensors_path.trim().trim_matches('/').is_empty() {
        return Err(ConfigError::Invalid("store.sensors_path must be non-empty"));
    }
    if cfg.store.request_timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "store.request_timeout_seconds must be > 0",
        ));
    }
    Ok(())
}

/// Returns the example YAML configuration.
pub fn example() -> &'static str {
    r#"app:
  language: "de"
  used_status: 1

store:
  database_url: "https://YOUR_PROJECT.firebaseio.com/"
  auth_token: "YOUR_DATABASE_SECRET_OR_ID_TOKEN"
  sensors_path: "projekt/sensors"
  request_timeout_seconds: 30

scanner:
  mode: "single_auto"
  formats: []
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.language, Language::German);
        assert_eq!(cfg.app.used_status, 1);
        assert_eq!(cfg.scanner.mode, ScanningMode::SingleAuto);
        assert!(cfg.scanner.formats.is_empty());
    }

    #[test]
    fn defaults_apply_when_sections_omitted() {
        let yaml = r#"app: {}
store:
  database_url: "https://demo.firebaseio.com"
  sensors_path: "projekt/sensors"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.app.language, Language::English);
        assert_eq!(cfg.app.used_status, 1);
        assert_eq!(cfg.store.request_timeout_seconds, 30);
        assert_eq!(cfg.store.auth(), None);
        assert_eq!(cfg.scanner, Scanner::default());
    }

    #[test]
    fn invalid_database_url() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.database_url = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("database_url")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.database_url = "ftp://demo".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_sensors_path_and_timeout() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.sensors_path = " / ".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("sensors_path")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.sensors_path = "//".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.request_timeout_seconds = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn blank_auth_token_is_absent() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.store.auth_token = Some("   ".into());
        assert_eq!(cfg.store.auth(), None);
        cfg.store.auth_token = Some("secret".into());
        assert_eq!(cfg.store.auth(), Some("secret"));
    }

    #[test]
    fn scanner_formats_parse_by_name() {
        let yaml = r#"app: {}
store:
  database_url: "https://demo.firebaseio.com"
  sensors_path: "projekt/sensors"
scanner:
  mode: "continuous"
  formats: ["qr_code", "ean_13"]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.scanner.mode, ScanningMode::Continuous);
        assert_eq!(
            cfg.scanner.formats,
            vec![BarcodeFormat::QrCode, BarcodeFormat::Ean13]
        );
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.store.sensors_path, "projekt/sensors");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("missing.yaml");
        assert!(matches!(load(Some(&p)), Err(ConfigError::Io(_))));
    }
}
