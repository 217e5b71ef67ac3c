//! Registry of parameter kinds.
//!
//! Every parameter port refers to a [`ParameterKind`]. The engine creates the
//! channel behind a port through this registry, so a kind must be registered
//! before a port of that kind can be declared. The registry is an ordinary
//! value shared through `Arc` with every [`FlowGraph`](crate::FlowGraph)
//! that uses it; there is no global table.
//!
//! # Example
//!
//! ```rust
//! use spatialflow_core::{ParameterRegistry, ParameterValue, ScalarParameter};
//!
//! let registry = ParameterRegistry::new();
//! assert!(registry.contains(ScalarParameter::<f32>::KIND));
//! for info in registry.all_kinds() {
//!     println!("{}: {}", info.kind, info.description);
//! }
//! ```

use crate::error::ConfigurationError;
use crate::parameter::{
    MatrixParameter, ParameterConfig, ParameterKind, ParameterValue, ScalarParameter,
    StringParameter, VectorParameter,
};
use crate::protocol::{DoubleBuffering, ErasedChannel, MessageQueue, ProtocolKind, SharedData};

/// Describes a registered parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Kind name.
    pub kind: ParameterKind,
    /// Brief description.
    pub description: &'static str,
    /// Rust type carried by channels of this kind.
    pub type_name: &'static str,
}

/// Factory function type for creating channels of one kind.
type ChannelFactory = fn(ProtocolKind, &ParameterConfig) -> Result<ErasedChannel, ConfigurationError>;

/// Validation function type for configurations of one kind.
type ConfigCheck = fn(&ParameterConfig) -> Result<(), ConfigurationError>;

/// Internal entry in the registry.
struct RegistryEntry {
    info: ParameterInfo,
    factory: ChannelFactory,
    check: ConfigCheck,
}

/// Registry of parameter kinds usable on parameter ports.
pub struct ParameterRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    /// Create a new registry with all built-in parameter types registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_kinds();
        registry
    }

    /// Create a registry without any kinds.
    pub fn empty() -> Self {
        Self {
            entries: Vec::with_capacity(12),
        }
    }

    fn register_builtin_kinds(&mut self) {
        // Built-in kinds have distinct names; registration cannot conflict.
        let _ = self.register::<ScalarParameter<f32>>();
        let _ = self.register::<ScalarParameter<f64>>();
        let _ = self.register::<ScalarParameter<i32>>();
        let _ = self.register::<ScalarParameter<bool>>();
        let _ = self.register::<VectorParameter<f32>>();
        let _ = self.register::<VectorParameter<f64>>();
        let _ = self.register::<MatrixParameter<f32>>();
        let _ = self.register::<MatrixParameter<f64>>();
        let _ = self.register::<StringParameter>();
    }

    /// Register parameter type `T` under `T::KIND`.
    ///
    /// Registering the same type twice is a no-op; registering a different
    /// type under an existing kind name fails.
    pub fn register<T: ParameterValue>(&mut self) -> Result<&mut Self, ConfigurationError> {
        let type_name = core::any::type_name::<T>();
        if let Some(existing) = self.entries.iter().find(|e| e.info.kind == T::KIND) {
            if existing.info.type_name == type_name {
                return Ok(self);
            }
            return Err(ConfigurationError::DuplicateParameterKind {
                kind: T::KIND,
                existing: existing.info.type_name,
            });
        }
        self.entries.push(RegistryEntry {
            info: ParameterInfo {
                kind: T::KIND,
                description: T::DESCRIPTION,
                type_name,
            },
            factory: create_channel::<T>,
            check: check_config::<T>,
        });
        Ok(self)
    }

    /// Returns descriptors for all registered kinds, in registration order.
    pub fn all_kinds(&self) -> Vec<ParameterInfo> {
        self.entries.iter().map(|e| e.info).collect()
    }

    /// Get the descriptor of a kind.
    pub fn get(&self, kind: ParameterKind) -> Option<ParameterInfo> {
        self.entry(kind).map(|e| e.info)
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: ParameterKind) -> bool {
        self.entry(kind).is_some()
    }

    /// Checks that `config` describes a value of `kind`.
    pub fn validate(
        &self,
        kind: ParameterKind,
        config: &ParameterConfig,
    ) -> Result<(), ConfigurationError> {
        let entry = self
            .entry(kind)
            .ok_or(ConfigurationError::UnknownParameterKind(kind))?;
        (entry.check)(config)
    }

    /// Creates a channel of `kind` using `protocol`, initialised from `config`.
    pub(crate) fn create_channel(
        &self,
        kind: ParameterKind,
        protocol: ProtocolKind,
        config: &ParameterConfig,
    ) -> Result<ErasedChannel, ConfigurationError> {
        let entry = self
            .entry(kind)
            .ok_or(ConfigurationError::UnknownParameterKind(kind))?;
        (entry.factory)(protocol, config)
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, kind: ParameterKind) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.info.kind == kind)
    }
}

fn create_channel<T: ParameterValue>(
    protocol: ProtocolKind,
    config: &ParameterConfig,
) -> Result<ErasedChannel, ConfigurationError> {
    let initial = T::from_config(config)?;
    Ok(match protocol {
        ProtocolKind::DoubleBuffering => ErasedChannel::new::<DoubleBuffering, T>(initial),
        ProtocolKind::MessageQueue => ErasedChannel::new::<MessageQueue, T>(initial),
        ProtocolKind::SharedData => ErasedChannel::new::<SharedData, T>(initial),
    })
}

fn check_config<T: ParameterValue>(config: &ParameterConfig) -> Result<(), ConfigurationError> {
    T::from_config(config).map(|_| ())
}
