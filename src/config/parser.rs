//! Settings parser for loading the optional settings file.
//!
//! Settings are resolved in this order: built-in defaults, the YAML file (if
//! any), then environment overrides.

use crate::error::{ConfigError, Result, SampleError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::settings::SampleSettings;

/// Environment variable that switches HTTP helpers to playback.
pub const TEST_MODE_ENV: &str = "AZURE_TEST_MODE";

/// Settings parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new settings parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to locate `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SampleSettings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(SampleError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SampleError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses settings from a YAML string. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<SampleSettings> {
        if content.trim().is_empty() {
            debug!("Empty settings document, using defaults");
            return Ok(SampleSettings::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            SampleError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Loads settings from an optional file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is given but cannot be read or parsed.
    pub fn load(&self, path: Option<&Path>) -> Result<SampleSettings> {
        let mut settings = match path {
            Some(p) => self.load_file(p)?,
            None => {
                debug!("No settings file, using defaults");
                SampleSettings::default()
            }
        };

        Self::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    /// Applies environment variable overrides to the settings.
    fn apply_env_overrides(settings: &mut SampleSettings) {
        if let Ok(region) = std::env::var("SAMPLE_REGION") {
            debug!("Overriding region from environment");
            settings.region = region;
        }

        if let Ok(url) = std::env::var("SAMPLE_PACKAGE_URL") {
            debug!("Overriding package_url from environment");
            settings.package_url = url;
        }

        if Self::playback_requested(std::env::var(TEST_MODE_ENV).ok().as_deref()) {
            debug!("{TEST_MODE_ENV} requests playback mode");
            settings.playback = true;
        }
    }

    /// Returns true if the test-mode value selects playback.
    #[must_use]
    pub fn playback_requested(test_mode: Option<&str>) -> bool {
        test_mode.is_some_and(|mode| mode.trim().eq_ignore_ascii_case("playback"))
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                SampleError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default settings file names to search for.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["webapp-sample.yaml", "webapp-sample.yml"];

/// Finds a settings file in the start directory or its parents.
///
/// Unlike a missing explicit `--config`, a missing default file is not an
/// error: the run falls back to built-in defaults.
#[must_use]
pub fn find_settings_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_SETTINGS_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found settings file: {}", candidate.display());
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_document() {
        let parser = ConfigParser::new();
        let settings = parser.parse_yaml("", None).expect("empty yaml should parse");
        assert_eq!(settings, SampleSettings::default());
    }

    #[test]
    fn test_parse_partial_document() {
        let yaml = r"
region: eastus2
log_stream_timeout_secs: 30
site:
  java_version: '11'
";
        let parser = ConfigParser::new();
        let settings = parser.parse_yaml(yaml, None).expect("yaml should parse");

        assert_eq!(settings.region, "eastus2");
        assert_eq!(settings.log_stream_timeout_secs, 30);
        assert_eq!(settings.site.java_version, "11");
        assert_eq!(settings.site.java_container, "TOMCAT");
        assert_eq!(settings.probe_offsets_secs, vec![5, 15, 25, 35]);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let parser = ConfigParser::new();
        let result = parser.parse_yaml("region: [unterminated", None);
        assert!(matches!(
            result,
            Err(SampleError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let parser = ConfigParser::new();
        let result = parser.load_file("/nonexistent/webapp-sample.yaml");
        assert!(matches!(
            result,
            Err(SampleError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_find_settings_file_in_parent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("Failed to create dirs");
        std::fs::write(temp.path().join("webapp-sample.yaml"), "region: northeurope\n")
            .expect("Failed to write settings");

        let found = find_settings_file(&nested).expect("settings file should be found");
        let settings = ConfigParser::new().load_file(&found).expect("settings should load");
        assert_eq!(settings.region, "northeurope");
    }

    #[test]
    fn test_playback_requested() {
        assert!(ConfigParser::playback_requested(Some("PLAYBACK")));
        assert!(ConfigParser::playback_requested(Some("playback ")));
        assert!(!ConfigParser::playback_requested(Some("RECORD")));
        assert!(!ConfigParser::playback_requested(None));
    }
}
