//! Parameter kinds, configurations and values.
//!
//! Parameter ports carry control data (gains, positions, matrices, commands)
//! between components, or between the audio thread and control threads. A
//! parameter port is typed by a [`ParameterKind`], a
//! [`ProtocolKind`](crate::ProtocolKind) and a [`ParameterConfig`]; two ports
//! may only be connected if all three match exactly.

mod types;

use core::fmt;

pub use types::{
    ArrayElement, MatrixParameter, ScalarParameter, ScalarValue, StringParameter,
    VectorParameter,
};

use crate::error::ConfigurationError;

/// Stable name identifying a parameter value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKind(&'static str);

impl ParameterKind {
    /// Creates a kind from its name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the kind name.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Shape of a parameter value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterConfig {
    /// Value has no shape (scalars, strings).
    #[default]
    Empty,
    /// One-dimensional value with `len` elements.
    Vector {
        /// Element count.
        len: usize,
    },
    /// Row-major matrix.
    Matrix {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },
}

impl fmt::Display for ParameterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterConfig::Empty => f.write_str("empty"),
            ParameterConfig::Vector { len } => write!(f, "vector[{len}]"),
            ParameterConfig::Matrix { rows, cols } => write!(f, "matrix[{rows}x{cols}]"),
        }
    }
}

/// A value type that can travel over parameter ports.
///
/// `from_config` builds the initial value of every channel created for this
/// kind, so it doubles as validation of the configuration.
pub trait ParameterValue: Clone + Send + Sync + 'static {
    /// Stable kind name.
    const KIND: ParameterKind;

    /// One-line human description, shown by diagnostic tooling.
    const DESCRIPTION: &'static str;

    /// Builds the default value for `config`, or rejects the configuration.
    fn from_config(config: &ParameterConfig) -> Result<Self, ConfigurationError>;
}

pub(crate) fn invalid_config(
    kind: ParameterKind,
    config: &ParameterConfig,
    reason: &'static str,
) -> ConfigurationError {
    ConfigurationError::InvalidParameterConfig {
        kind,
        config: *config,
        reason: reason.into(),
    }
}
