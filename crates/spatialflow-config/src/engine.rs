//! Engine configuration file format and operations.

use serde::{Deserialize, Serialize};
use spatialflow_core::{FlowOptions, SignalFlowContext};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Settings an application needs to build and run a signal flow.
///
/// Every section and field has a default, so an empty file is a valid
/// configuration.
///
/// # TOML Format
///
/// ```toml
/// [context]
/// period = 64
/// sample_rate = 48000
///
/// [memory]
/// alignment_bytes = 32
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Block length and sample rate.
    pub context: ContextConfig,
    /// Communication-area layout.
    pub memory: MemoryConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// `[context]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    /// Samples per block.
    pub period: usize,
    /// Sampling rate in Hz.
    pub sample_rate: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            period: 64,
            sample_rate: 48000,
        }
    }
}

/// `[memory]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Byte alignment of every communication-area row.
    pub alignment_bytes: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            alignment_bytes: FlowOptions::default().alignment_bytes,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    ///
    /// The file is parsed only; call [`validate`](Self::validate) before use.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every field, reporting all problems together.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Signal-flow context for a [`FlowGraph`](spatialflow_core::FlowGraph).
    pub fn context(&self) -> Result<SignalFlowContext, ConfigError> {
        Ok(SignalFlowContext::new(
            self.context.period,
            self.context.sample_rate,
        )?)
    }

    /// Options for [`AudioSignalFlow::with_options`](spatialflow_core::AudioSignalFlow::with_options).
    pub fn flow_options(&self) -> Result<FlowOptions, ConfigError> {
        let options = FlowOptions {
            alignment_bytes: self.memory.alignment_bytes,
        };
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.context.period, 64);
        assert_eq!(config.context.sample_rate, 48000);
        assert_eq!(config.memory.alignment_bytes, 32);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_toml(
            r#"
[context]
period = 256

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.context.period, 256);
        assert_eq!(config.context.sample_rate, 48000);
        assert_eq!(config.memory.alignment_bytes, 32);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = EngineConfig::from_toml("[context]\nperiod = \"large\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_to_toml_contains_sections() {
        let toml = EngineConfig::default().to_toml().unwrap();
        assert!(toml.contains("[context]"));
        assert!(toml.contains("period = 64"));
        assert!(toml.contains("alignment_bytes = 32"));
        assert!(toml.contains("level = \"info\""));
    }

    #[test]
    fn test_context_and_options() {
        let mut config = EngineConfig::default();
        config.context.period = 128;
        config.context.sample_rate = 44100;
        config.memory.alignment_bytes = 64;

        let context = config.context().unwrap();
        assert_eq!(context.period(), 128);
        assert_eq!(context.sample_rate(), 44100);
        assert_eq!(config.flow_options().unwrap().alignment_bytes, 64);
    }

    #[test]
    fn test_invalid_values_rejected_by_engine_too() {
        let mut config = EngineConfig::default();
        config.context.period = 0;
        config.memory.alignment_bytes = 12;

        assert!(matches!(config.validate(), Err(ValidationError::Multiple(_))));
        assert!(matches!(config.context(), Err(ConfigError::Engine(_))));
        assert!(matches!(config.flow_options(), Err(ConfigError::Engine(_))));
    }
}
