//! Engine configuration validation.
//!
//! Every section is checked and all problems are reported together, so a
//! hand-edited file can be fixed in one pass.

use spatialflow_core::FlowOptions;
use thiserror::Error;

use crate::engine::EngineConfig;

/// Log levels accepted in `[logging] level`.
pub const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `context.period` is zero.
    #[error("context.period must be greater than zero")]
    ZeroPeriod,

    /// `context.sample_rate` is zero.
    #[error("context.sample_rate must be greater than zero")]
    ZeroSampleRate,

    /// `memory.alignment_bytes` is not an accepted alignment.
    #[error("memory.alignment_bytes must be a power of two in 4..={max}, got {value}")]
    Alignment {
        /// The configured alignment.
        value: usize,
        /// Largest accepted alignment.
        max: usize,
    },

    /// `logging.level` names no known level.
    #[error("unknown logging.level '{0}' (expected one of: off, error, warn, info, debug, trace)")]
    UnknownLogLevel(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Whether `level` is one of [`LOG_LEVELS`], ignoring case.
pub fn is_log_level(level: &str) -> bool {
    LOG_LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level))
}

/// Checks every field of `config`.
///
/// A single problem is returned as itself; several are wrapped in
/// [`ValidationError::Multiple`] in section order.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if config.context.period == 0 {
        errors.push(ValidationError::ZeroPeriod);
    }
    if config.context.sample_rate == 0 {
        errors.push(ValidationError::ZeroSampleRate);
    }

    let alignment = config.memory.alignment_bytes;
    if !alignment.is_power_of_two() || !(4..=FlowOptions::MAX_ALIGNMENT).contains(&alignment) {
        errors.push(ValidationError::Alignment {
            value: alignment,
            max: FlowOptions::MAX_ALIGNMENT,
        });
    }

    if !is_log_level(&config.logging.level) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&EngineConfig::default()), Ok(()));
    }

    #[test]
    fn test_single_error_is_not_wrapped() {
        let mut config = EngineConfig::default();
        config.context.sample_rate = 0;
        assert_eq!(validate_config(&config), Err(ValidationError::ZeroSampleRate));
    }

    #[test]
    fn test_alignment_rules() {
        let mut config = EngineConfig::default();
        for bad in [0, 2, 24, 8192] {
            config.memory.alignment_bytes = bad;
            assert!(
                matches!(validate_config(&config), Err(ValidationError::Alignment { value, .. }) if value == bad),
                "alignment {bad} should be rejected"
            );
        }
        for good in [4, 8, 64, 4096] {
            config.memory.alignment_bytes = good;
            assert_eq!(validate_config(&config), Ok(()), "alignment {good}");
        }
    }

    #[test]
    fn test_log_level_case_insensitive() {
        assert!(is_log_level("DEBUG"));
        assert!(is_log_level("warn"));
        assert!(!is_log_level("verbose"));
    }

    #[test]
    fn test_all_errors_reported_in_section_order() {
        let mut config = EngineConfig::default();
        config.context.period = 0;
        config.memory.alignment_bytes = 3;
        config.logging.level = "loud".to_string();

        let Err(ValidationError::Multiple(errors)) = validate_config(&config) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::ZeroPeriod);
        assert!(matches!(errors[1], ValidationError::Alignment { value: 3, .. }));
        assert_eq!(errors[2], ValidationError::UnknownLogLevel("loud".to_string()));

        let msg = ValidationError::Multiple(errors).to_string();
        assert!(msg.starts_with("multiple validation errors: context.period"), "got: {msg}");
    }
}
