//! Component storage and the atomic component contract.

use super::ComponentId;
use super::connection::{AudioConnection, ParameterConnection};
use super::port::{AudioPort, ParameterPort};
use crate::error::ComponentError;
use crate::flow::ProcessIo;

/// A leaf component performing actual computation.
///
/// Components are created by the setup closure passed to
/// [`FlowGraph::add_atomic`](super::FlowGraph::add_atomic), which declares
/// their ports through a [`PortBuilder`](super::PortBuilder). After that the
/// engine calls [`process`](Self::process) once per block in schedule order.
///
/// `process` runs on the audio thread: it must not allocate, block or perform
/// I/O. Errors are fatal for the engine instance.
///
/// # Example
///
/// ```rust
/// use spatialflow_core::{AtomicComponent, AudioInput, AudioOutput, ComponentError, ProcessIo};
///
/// struct Invert {
///     input: AudioInput<f32>,
///     output: AudioOutput<f32>,
/// }
///
/// impl AtomicComponent for Invert {
///     fn process(&mut self, io: &mut ProcessIo<'_>) -> Result<(), ComponentError> {
///         for ch in 0..self.input.width() {
///             let (src, dst) = io.transfer(&self.input, ch, &self.output, ch);
///             for (d, s) in dst.iter_mut().zip(src) {
///                 *d = -*s;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait AtomicComponent: Send + 'static {
    /// Processes one block.
    fn process(&mut self, io: &mut ProcessIo<'_>) -> Result<(), ComponentError>;
}

/// Whether a component computes or nests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Leaf with a `process()` implementation.
    Atomic,
    /// Container of child components and connections.
    Composite,
}

pub(crate) struct ComponentNode {
    pub name: String,
    pub parent: Option<ComponentId>,
    pub audio_ports: Vec<AudioPort>,
    pub parameter_ports: Vec<ParameterPort>,
    pub body: ComponentBody,
}

pub(crate) enum ComponentBody {
    Atomic {
        component: Box<dyn AtomicComponent>,
        type_name: &'static str,
    },
    Composite(CompositeBody),
}

#[derive(Default)]
pub(crate) struct CompositeBody {
    pub children: Vec<ComponentId>,
    pub audio_connections: Vec<AudioConnection>,
    pub parameter_connections: Vec<ParameterConnection>,
}

impl ComponentNode {
    pub fn kind(&self) -> ComponentKind {
        match self.body {
            ComponentBody::Atomic { .. } => ComponentKind::Atomic,
            ComponentBody::Composite(_) => ComponentKind::Composite,
        }
    }

    pub fn composite(&self) -> Option<&CompositeBody> {
        match &self.body {
            ComponentBody::Composite(body) => Some(body),
            ComponentBody::Atomic { .. } => None,
        }
    }

    pub fn composite_mut(&mut self) -> Option<&mut CompositeBody> {
        match &mut self.body {
            ComponentBody::Composite(body) => Some(body),
            ComponentBody::Atomic { .. } => None,
        }
    }
}
