//! Configuration traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::LoggingConfig;
use crate::error::{Result, StatusError};

/// Trait for status-line configuration types.
///
/// Implement this trait for the top-level configuration struct to get
/// loading, validation, and access to the logging section.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use bstatus_framework::{LoggingConfig, StatusConfig, StatusError};
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyConfig {
///     pub logging: LoggingConfig,
///     pub sources: Vec<MySourceConfig>,
/// }
///
/// impl StatusConfig for MyConfig {
///     fn logging(&self) -> &LoggingConfig {
///         &self.logging
///     }
///
///     fn validate(&self) -> Result<()> {
///         if self.sources.is_empty() {
///             return Err(StatusError::validation("At least one source required"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait StatusConfig: Sized + DeserializeOwned {
    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Validate the configuration.
    ///
    /// Called automatically after loading. Override to add custom validation.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(StatusError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        logging: LoggingConfig,
        sources: Vec<String>,
    }

    impl StatusConfig for TestConfig {
        fn logging(&self) -> &LoggingConfig {
            &self.logging
        }

        fn validate(&self) -> Result<()> {
            if self.sources.is_empty() {
                return Err(StatusError::validation("At least one source required"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_config_not_found() {
        let result = TestConfig::load("/nonexistent/path.json5");
        assert!(matches!(result, Err(StatusError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_config_load_and_validate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ sources: ['clock'], logging: {{ level: 'debug' }} }}").unwrap();

        let config = TestConfig::load(file.path()).unwrap();
        assert_eq!(config.sources, vec!["clock"]);
        assert_eq!(config.logging().level, "debug");
    }

    #[test]
    fn test_config_validation_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ sources: [] }}").unwrap();

        let result = TestConfig::load(file.path());
        assert!(matches!(result, Err(StatusError::ConfigValidation(_))));
    }

    #[test]
    fn test_config_parse_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ sources: [").unwrap();

        let result = TestConfig::load(file.path());
        assert!(matches!(result, Err(StatusError::ConfigParse(_))));
    }
}
