//! TOML configuration for the spatialflow signal-flow engine.
//!
//! An [`EngineConfig`] carries what an application needs before it builds a
//! [`FlowGraph`](spatialflow_core::FlowGraph): the block length and sample
//! rate, the row alignment of the communication areas, and the default log
//! level.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spatialflow_config::EngineConfig;
//! use spatialflow_core::{FlowGraph, ParameterRegistry};
//!
//! let config = EngineConfig::load("engine.toml").unwrap();
//! config.validate().unwrap();
//!
//! let graph = FlowGraph::new(
//!     "renderer",
//!     config.context().unwrap(),
//!     Arc::new(ParameterRegistry::new()),
//! )
//! .unwrap();
//! ```

mod engine;
mod error;

/// Engine configuration validation.
pub mod validation;

pub use engine::{ContextConfig, EngineConfig, LoggingConfig, MemoryConfig};
pub use error::ConfigError;
pub use validation::{LOG_LEVELS, ValidationError, ValidationResult, is_log_level, validate_config};
