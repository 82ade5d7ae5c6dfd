use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use thiserror::Error;

#[derive(Debug, Error)]
/// # Settings Error
///
/// Defines the failures that can occur while loading library settings from
/// disk.
pub enum SettingsError {
    /// An I/O error occurred while reading the settings file.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The settings document could not be parsed.
    #[error("Failed to parse settings: {0}")]
    ParseError(String),
}

fn default_inat_rate_limit() -> u32 {
    60
}

fn default_cache_ttl_hours() -> u32 {
    24
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
/// # Library Settings
///
/// API keys, rate limits and caching knobs for the Ontario data sources.
/// Every field has a default so a settings file only needs to name what it
/// overrides.
pub struct Settings {
    /// API key for the eBird API. Optional, but required for eBird data.
    #[serde(default)]
    pub ebird_api_key: Option<String>,

    /// API key for the DataStream water quality API. Optional.
    #[serde(default)]
    pub datastream_api_key: Option<String>,

    /// Rate limit for the iNaturalist API in requests per minute.
    #[serde(default = "default_inat_rate_limit")]
    pub inat_rate_limit: u32,

    /// Cache time-to-live in hours for cached data.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ebird_api_key: None,
            datastream_api_key: None,
            inat_rate_limit: default_inat_rate_limit(),
            cache_ttl_hours: default_cache_ttl_hours(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON5 document.
    ///
    /// JSON5 keeps the files hand-editable: comments and trailing commas are
    /// accepted.
    ///
    /// # Arguments
    /// * `text` - The settings document.
    pub fn from_json5(text: &str) -> Result<Self, SettingsError> {
        json5::from_str(text).map_err(|e| SettingsError::ParseError(e.to_string()))
    }

    /// Loads settings from a JSON5 file on disk.
    ///
    /// # Arguments
    /// * `path` - Path to the settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        Self::from_json5(&text)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // API keys are never printed, only whether they are present.
        write!(
            f,
            "Settings
    eBird API key: {},
    DataStream API key: {},
    iNaturalist rate limit: {} requests/minute,
    Cache TTL: {} hours
",
            if self.ebird_api_key.is_some() {
                "configured"
            } else {
                "not set"
            },
            if self.datastream_api_key.is_some() {
                "configured"
            } else {
                "not set"
            },
            self.inat_rate_limit,
            self.cache_ttl_hours
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ebird_api_key, None);
        assert_eq!(settings.datastream_api_key, None);
        assert_eq!(settings.inat_rate_limit, 60);
        assert_eq!(settings.cache_ttl_hours, 24);
    }

    #[test]
    fn test_empty_document_applies_defaults() {
        let settings = Settings::from_json5("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_json5_with_comments_and_overrides() {
        let text = r#"{
            // Credentials live outside version control.
            ebird_api_key: "key123",
            inat_rate_limit: 100,
            cache_ttl_hours: 12,
        }"#;
        let settings = Settings::from_json5(text).unwrap();
        assert_eq!(settings.ebird_api_key.as_deref(), Some("key123"));
        assert_eq!(settings.datastream_api_key, None);
        assert_eq!(settings.inat_rate_limit, 100);
        assert_eq!(settings.cache_ttl_hours, 12);
    }

    #[test]
    fn test_garbage_document_is_a_parse_error() {
        let err = Settings::from_json5("not a document").unwrap_err();
        assert!(matches!(err, SettingsError::ParseError(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let original = Settings {
            ebird_api_key: Some("abc".to_string()),
            datastream_api_key: None,
            inat_rate_limit: 30,
            cache_ttl_hours: 6,
        };
        let text = serde_json::to_string_pretty(&original).unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = Settings::from_file(file.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = Settings::from_file("/nonexistent/ontario-settings.json5").unwrap_err();
        assert!(matches!(err, SettingsError::IoError(_)));
    }

    #[test]
    fn test_display_never_exposes_keys() {
        let settings = Settings {
            ebird_api_key: Some("secret-key".to_string()),
            ..Settings::default()
        };
        let rendered = settings.to_string();
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("configured"));
    }
}
