//! Spatialflow Core - block-synchronous signal-flow engine
//!
//! This crate turns a user-declared hierarchy of processing components into a
//! flat, cycle-free schedule that runs once per fixed-size audio block with no
//! allocation or locking on the audio path.
//!
//! # Core Abstractions
//!
//! ## Graph Model
//!
//! - [`FlowGraph`] - Arena of atomic and composite components, their ports and
//!   connection descriptors
//! - [`AtomicComponent`] - Leaf components implementing `process()`
//! - [`PortBuilder`] - Typed port declaration during atomic setup
//! - [`ChannelList`] - Channel selections for audio connections
//!
//! ## Parameters
//!
//! - [`ParameterValue`] - Values carried over parameter ports
//! - [`ParameterRegistry`] - Explicit registry of parameter kinds
//! - [`DoubleBuffering`], [`MessageQueue`], [`SharedData`] - Communication
//!   protocols between producers and consumers
//!
//! ## Runtime
//!
//! - [`AudioSignalFlow`] - Validates, flattens and schedules a [`FlowGraph`],
//!   then executes it per block
//! - [`CommunicationArea`] - Aligned sample storage shared by all audio signals
//! - [`IntegrityReport`] - Every violation found while checking a graph
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use spatialflow_core::{
//!     AudioPortSpec, AudioSignalFlow, FlowGraph, ParameterRegistry, SignalFlowContext,
//!     components::Gain,
//! };
//!
//! # fn main() -> Result<(), spatialflow_core::ConfigurationError> {
//! let context = SignalFlowContext::new(64, 48_000)?;
//! let mut graph = FlowGraph::new("renderer", context, Arc::new(ParameterRegistry::new()))?;
//! let root = graph.root();
//! let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(2))?;
//! let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(2))?;
//! let gain = graph.add_atomic(root, "gain", |ports| Gain::new(ports, 2, 0.5))?;
//! graph.connect_audio(root, input, .., graph.audio_input(gain, "in")?, ..)?;
//! graph.connect_audio(root, graph.audio_output(gain, "out")?, .., output, ..)?;
//!
//! let mut flow = AudioSignalFlow::new(graph)?;
//! let left = [1.0f32; 64];
//! let right = [2.0f32; 64];
//! let mut out_l = [0.0f32; 64];
//! let mut out_r = [0.0f32; 64];
//! flow.process::<f32>(&[&left, &right], &mut [&mut out_l, &mut out_r]).unwrap();
//! assert_eq!(out_r[0], 1.0);
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod context;
pub mod error;
pub mod flow;
pub mod graph;
pub mod parameter;
pub mod protocol;
pub mod registry;
pub mod sample;

pub use context::{FlowOptions, SignalFlowContext};
pub use error::{ComponentError, ConfigurationError, ProcessingFault, ProtocolError};
pub use flow::{
    AudioEndpoint, AudioSignalFlow, CommunicationArea, FlatAudioLink, FlatParameterLink,
    FlowState, IntegrityReport, ProcessIo, Violation, ViolationKind,
};
pub use graph::{
    AtomicComponent, AudioConnection, AudioInput, AudioOutput, AudioPort, AudioPortId,
    AudioPortSpec, ChannelList, ComponentId, ComponentKind, FlowGraph, ParameterConnection,
    ParameterInput, ParameterOutput, ParameterPort, ParameterPortId, ParameterPortSpec,
    PortBuilder, PortDirection,
};
pub use parameter::{
    MatrixParameter, ParameterConfig, ParameterKind, ParameterValue, ScalarParameter,
    StringParameter, VectorParameter,
};
pub use protocol::{
    DoubleBufferInput, DoubleBufferOutput, DoubleBuffering, MessageQueue, MessageQueueInput,
    MessageQueueOutput, Protocol, ProtocolKind, SharedData, SharedDataInput, SharedDataOutput,
};
pub use registry::{ParameterInfo, ParameterRegistry};
pub use sample::{Sample, SampleType};
