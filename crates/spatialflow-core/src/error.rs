//! Error types for graph setup, parameter protocols and block processing.

use std::borrow::Cow;

use thiserror::Error;

use crate::flow::{FlowState, IntegrityReport};
use crate::graph::{ComponentId, PortDirection};
use crate::parameter::{ParameterConfig, ParameterKind};
use crate::protocol::ProtocolKind;
use crate::sample::SampleType;

/// Errors raised while a graph is built or an engine is set up.
///
/// None of these can occur once [`AudioSignalFlow::new`](crate::AudioSignalFlow::new)
/// has returned successfully.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The block period or sample rate is unusable.
    #[error("invalid signal-flow context: {0}")]
    InvalidContext(Cow<'static, str>),

    /// Engine options are out of range.
    #[error("invalid flow options: {0}")]
    InvalidOptions(Cow<'static, str>),

    /// The id does not belong to this graph.
    #[error("component {0} does not exist")]
    UnknownComponent(ComponentId),

    /// No port with that name, direction and category exists.
    #[error("component `{path}` has no {direction} {category} port `{name}`")]
    UnknownPort {
        /// Path of the component that was searched.
        path: String,
        /// Direction that was searched.
        direction: PortDirection,
        /// `"audio"` or `"parameter"`.
        category: &'static str,
        /// Requested port name.
        name: String,
    },

    /// The port id was not issued by this graph.
    #[error("port {0} does not belong to this graph")]
    ForeignPort(String),

    /// A component or port name is empty or contains the path separator.
    #[error("invalid name `{0}`: names must be non-empty and must not contain '/'")]
    InvalidName(String),

    /// A sibling with the same name already exists.
    #[error("component `{parent}` already has a child named `{name}`")]
    DuplicateName {
        /// Path of the parent composite.
        parent: String,
        /// Conflicting child name.
        name: String,
    },

    /// A port with the same name, direction and category already exists.
    #[error("component `{path}` already has a {direction} {category} port named `{name}`")]
    DuplicatePort {
        /// Path of the owning component.
        path: String,
        /// Direction of the conflicting port.
        direction: PortDirection,
        /// `"audio"` or `"parameter"`.
        category: &'static str,
        /// Conflicting port name.
        name: String,
    },

    /// Children, boundary ports and connections belong to composites only.
    #[error("component `{0}` is atomic and cannot hold children, boundary ports or connections")]
    NotComposite(String),

    /// Audio port widths can be set exactly once.
    #[error("width of port `{path}.{port}` is already set to {width}")]
    WidthAlreadySet {
        /// Path of the owning component.
        path: String,
        /// Port name.
        port: String,
        /// Width that is already in effect.
        width: usize,
    },

    /// The parameter kind was never registered.
    #[error("parameter kind `{0}` is not registered")]
    UnknownParameterKind(ParameterKind),

    /// A parameter type was registered twice under one kind.
    #[error("parameter kind `{kind}` is already registered for `{existing}`")]
    DuplicateParameterKind {
        /// Kind name.
        kind: ParameterKind,
        /// Rust type already registered for the kind.
        existing: &'static str,
    },

    /// The configuration does not describe a value of the kind.
    #[error("invalid configuration {config} for parameter kind `{kind}`: {reason}")]
    InvalidParameterConfig {
        /// Parameter kind.
        kind: ParameterKind,
        /// Offending configuration.
        config: ParameterConfig,
        /// Why it was rejected.
        reason: Cow<'static, str>,
    },

    /// No unclaimed top-level parameter endpoint with that name exists.
    #[error("no unclaimed top-level {direction} parameter port named `{name}`")]
    UnknownExternalParameter {
        /// Direction of the top-level port.
        direction: PortDirection,
        /// Port name.
        name: String,
    },

    /// An atomic component rejected its setup arguments.
    #[error("setup of `{path}` failed: {reason}")]
    Setup {
        /// Path of the component being set up.
        path: String,
        /// Why setup failed.
        reason: Cow<'static, str>,
    },

    /// The graph failed the integrity check.
    #[error("{0}")]
    Integrity(IntegrityReport),

    /// A parameter channel could not be bound.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ConfigurationError {
    /// Creates a setup failure for the component at `path`.
    pub fn setup(path: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> Self {
        ConfigurationError::Setup {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Violations of a communication protocol's contract at use time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// `front` or `pop` on an empty message queue.
    #[error("message queue is empty")]
    EmptyQueue,

    /// A second receiver was connected to a single-consumer output.
    #[error("the {0} protocol does not support more than one receiver")]
    FanOutUnsupported(ProtocolKind),

    /// A bound endpoint was requested with the wrong protocol or value type.
    #[error("parameter endpoint type mismatch: requested `{expected}`, bound `{actual}`")]
    TypeMismatch {
        /// Type that was requested.
        expected: &'static str,
        /// Type that is actually bound.
        actual: &'static str,
    },

    /// Shared data touched from a thread other than the one that first used it.
    #[error("shared data accessed from a thread other than its owner")]
    CrossThreadAccess,

    /// Shared data is borrowed through another endpoint right now.
    #[error("shared data is already borrowed")]
    Busy,

    /// The port has no endpoint bound to it.
    #[error("parameter port is not bound")]
    Unbound,
}

/// Failure reported by an [`AtomicComponent`](crate::AtomicComponent) from `process()`.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// A parameter protocol rejected an operation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Component-specific failure.
    #[error("{0}")]
    Failed(Cow<'static, str>),
}

impl ComponentError {
    /// Creates a component-specific failure.
    pub fn failed(reason: impl Into<Cow<'static, str>>) -> Self {
        ComponentError::Failed(reason.into())
    }
}

/// Fatal error from [`AudioSignalFlow::process`](crate::AudioSignalFlow::process).
///
/// A faulted engine refuses further blocks.
#[derive(Debug, Error)]
pub enum ProcessingFault {
    /// An atomic component failed.
    #[error("component `{path}` failed: {source}")]
    Component {
        /// Path of the failing component.
        path: String,
        /// Error returned by the component.
        #[source]
        source: ComponentError,
    },

    /// The number of external buffers differs from the top-level port widths.
    #[error("expected {expected} external {direction} channels, got {actual}")]
    ChannelCount {
        /// Capture (`Input`) or playback (`Output`) side.
        direction: PortDirection,
        /// Channels declared by the top-level component.
        expected: usize,
        /// Buffers supplied.
        actual: usize,
    },

    /// An external buffer does not hold exactly one period.
    #[error("external {direction} channel {channel} holds {actual} samples, expected {expected}")]
    BlockLength {
        /// Capture (`Input`) or playback (`Output`) side.
        direction: PortDirection,
        /// Channel index.
        channel: usize,
        /// Block period.
        expected: usize,
        /// Buffer length supplied.
        actual: usize,
    },

    /// External buffers use a different sample type than the top-level ports.
    #[error("external ports carry {expected} samples, called with {actual}")]
    SampleTypeMismatch {
        /// Sample type of the top-level ports.
        expected: SampleType,
        /// Sample type of the supplied buffers.
        actual: SampleType,
    },

    /// The engine is not in a state that allows processing.
    #[error("signal flow is {0} and cannot process")]
    NotRunnable(FlowState),
}
