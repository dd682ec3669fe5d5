//! Cleaner configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional JSON file,
//! environment variables (a `.env` file is honoured by the binary), then CLI flags.

use crate::error::{CleanerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum share of alphabetic characters that must be Latin script for a query to be kept
pub const DEFAULT_LATIN_THRESHOLD: f64 = 0.7;

pub const LATIN_THRESHOLD_ENV: &str = "GSC_LATIN_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub latin_threshold: f64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            latin_threshold: DEFAULT_LATIN_THRESHOLD,
        }
    }
}

impl CleanerConfig {
    /// Load configuration from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CleanerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(LATIN_THRESHOLD_ENV) {
            self.latin_threshold = raw.trim().parse().map_err(|_| {
                CleanerError::InvalidConfig(format!(
                    "{} must be a number between 0 and 1, got '{}'",
                    LATIN_THRESHOLD_ENV, raw
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_latin_threshold(mut self, threshold: f64) -> Self {
        self.latin_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.latin_threshold) {
            return Err(CleanerError::InvalidConfig(format!(
                "latin_threshold must be within [0, 1], got {}",
                self.latin_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_threshold() {
        let config = CleanerConfig::default();
        assert_eq!(config.latin_threshold, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_default() {
        let vars: HashMap<&str, &str> = [(LATIN_THRESHOLD_ENV, " 0.5 ")].into_iter().collect();
        let config = CleanerConfig::default()
            .with_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.latin_threshold, 0.5);
    }

    #[test]
    fn test_invalid_env_value() {
        let result = CleanerConfig::default().with_vars(|_| Some("lots".to_string()));
        assert!(matches!(result, Err(CleanerError::InvalidConfig(_))));

        let result = CleanerConfig::default().with_vars(|_| Some("1.5".to_string()));
        assert!(matches!(result, Err(CleanerError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cleaner.json");
        std::fs::write(&path, r#"{"latin_threshold": 0.9}"#).unwrap();

        let config = CleanerConfig::load(&path).unwrap();
        assert_eq!(config.latin_threshold, 0.9);

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(CleanerConfig::load(&path).unwrap(), CleanerConfig::default());
    }
}
