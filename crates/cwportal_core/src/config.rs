//! Store configuration: key names, schema version, legacy sources and
//! record defaults.
//!
//! # Invariants
//! - Primary, backup and version-marker keys are non-empty and distinct.
//! - Every field has a default, so partial JSON files are accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Schema version written to the version-marker key.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0";

/// Configuration failures.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Parse(err) => write!(f, "cannot parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage key names used by the current layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageKeys {
    /// Main location, read first.
    pub primary: String,
    /// Redundant copies, written and read in this order.
    pub backups: Vec<String>,
    /// Holds the schema version the data was last migrated to.
    pub version_marker: String,
    /// Key used in the session partition.
    pub session: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            primary: "cw_articles".to_string(),
            backups: vec![
                "cw_articles_backup_1".to_string(),
                "cw_articles_backup_2".to_string(),
                "cw_articles_backup_3".to_string(),
            ],
            version_marker: "cw_articles_schema_version".to_string(),
            session: "cw_articles".to_string(),
        }
    }
}

/// How a legacy key encodes its article list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyFormat {
    /// `[ {...}, {...} ]`
    BareArray,
    /// `{ "articles": [ ... ] }`
    Wrapped,
}

/// One entry of the migration priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySource {
    pub key: String,
    pub format: LegacyFormat,
}

impl LegacySource {
    pub fn new(key: impl Into<String>, format: LegacyFormat) -> Self {
        Self {
            key: key.into(),
            format,
        }
    }
}

/// Values substituted for missing fields during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordDefaults {
    pub title: String,
    pub category: String,
    pub author: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            title: "Untitled Article".to_string(),
            category: "General".to_string(),
            author: "Admin".to_string(),
        }
    }
}

/// Full article store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub keys: StorageKeys,
    pub schema_version: String,
    /// Older layouts scanned in order by migration, after the current
    /// primary key. First non-empty decode wins.
    pub legacy_sources: Vec<LegacySource>,
    pub defaults: RecordDefaults,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let legacy_sources = vec![
            LegacySource::new("articles", LegacyFormat::BareArray),
            LegacySource::new("cms_articles", LegacyFormat::Wrapped),
            LegacySource::new("admin_articles", LegacyFormat::BareArray),
        ];
        Self {
            keys: StorageKeys::default(),
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            legacy_sources,
            defaults: RecordDefaults::default(),
        }
    }
}

impl StoreConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses and validates JSON config text. Missing fields take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks key names and schema version.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "schemaVersion cannot be empty".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        let persistent_keys = std::iter::once(&self.keys.primary)
            .chain(self.keys.backups.iter())
            .chain(std::iter::once(&self.keys.version_marker));
        for key in persistent_keys {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid("storage keys cannot be empty".to_string()));
            }
            if !seen.insert(key.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate storage key `{key}`")));
            }
        }

        if self.keys.session.trim().is_empty() {
            return Err(ConfigError::Invalid("session key cannot be empty".to_string()));
        }
        if self.legacy_sources.iter().any(|source| source.key.trim().is_empty()) {
            return Err(ConfigError::Invalid("legacy source keys cannot be empty".to_string()));
        }

        Ok(())
    }
}
