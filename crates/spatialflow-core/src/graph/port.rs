//! Port declarations and handles.
//!
//! Ports live inside their owning component and are addressed by
//! [`AudioPortId`] / [`ParameterPortId`] (component + port index). Atomic
//! components additionally receive typed handles ([`AudioInput`],
//! [`AudioOutput`], [`ParameterInput`], [`ParameterOutput`]) from the
//! [`PortBuilder`](super::PortBuilder) that they keep and pass to
//! [`ProcessIo`](crate::ProcessIo) inside `process()`.

use core::fmt;
use core::marker::PhantomData;

use super::ComponentId;
use crate::parameter::{ParameterConfig, ParameterKind, ParameterValue};
use crate::protocol::{Protocol, ProtocolKind};
use crate::sample::{Sample, SampleType};

/// Direction of a port, seen from its owning component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortDirection {
    /// Data flows into the component.
    Input,
    /// Data flows out of the component.
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        })
    }
}

/// Identifies an audio port within a [`FlowGraph`](super::FlowGraph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioPortId {
    pub(crate) component: ComponentId,
    pub(crate) index: u32,
}

impl AudioPortId {
    /// Owning component.
    #[inline]
    pub fn component(self) -> ComponentId {
        self.component
    }

    /// Position among the component's audio ports.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Identifies a parameter port within a [`FlowGraph`](super::FlowGraph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterPortId {
    pub(crate) component: ComponentId,
    pub(crate) index: u32,
}

impl ParameterPortId {
    /// Owning component.
    #[inline]
    pub fn component(self) -> ComponentId {
        self.component
    }

    /// Position among the component's parameter ports.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// A declared audio port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioPort {
    pub(crate) name: String,
    pub(crate) direction: PortDirection,
    pub(crate) sample_type: SampleType,
    pub(crate) width: Option<usize>,
    pub(crate) optional: bool,
}

impl AudioPort {
    /// Port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Sample element type.
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Channel count, if set.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Whether an input may stay unconnected (it then reads silence).
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A declared parameter port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterPort {
    pub(crate) name: String,
    pub(crate) direction: PortDirection,
    pub(crate) kind: ParameterKind,
    pub(crate) protocol: ProtocolKind,
    pub(crate) config: ParameterConfig,
    pub(crate) optional: bool,
}

impl ParameterPort {
    /// Port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Parameter kind.
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Communication protocol.
    pub fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    /// Value shape.
    pub fn config(&self) -> ParameterConfig {
        self.config
    }

    /// Whether an input may stay unconnected (it then reads the default value).
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Declaration of an audio port on a composite component.
///
/// ```rust
/// use spatialflow_core::{AudioPortSpec, SampleType};
///
/// let spec = AudioPortSpec::input("objects").sample_type(SampleType::F64).width(16);
/// assert_eq!(spec.name(), "objects");
/// ```
#[derive(Clone, Debug)]
pub struct AudioPortSpec {
    pub(crate) port: AudioPort,
}

impl AudioPortSpec {
    fn new(name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            port: AudioPort {
                name: name.into(),
                direction,
                sample_type: SampleType::F32,
                width: None,
                optional: false,
            },
        }
    }

    /// `f32` input port with its width still unset.
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Input)
    }

    /// `f32` output port with its width still unset.
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Output)
    }

    /// Sets the sample type.
    pub fn sample_type(mut self, sample_type: SampleType) -> Self {
        self.port.sample_type = sample_type;
        self
    }

    /// Sets the channel count.
    pub fn width(mut self, width: usize) -> Self {
        self.port.width = Some(width);
        self
    }

    /// Marks the port as optional.
    pub fn optional(mut self) -> Self {
        self.port.optional = true;
        self
    }

    /// Port name.
    pub fn name(&self) -> &str {
        &self.port.name
    }
}

/// Declaration of a parameter port on a composite component.
#[derive(Clone, Debug)]
pub struct ParameterPortSpec {
    pub(crate) port: ParameterPort,
}

impl ParameterPortSpec {
    /// Port of the given kind and protocol with an empty configuration.
    pub fn new(
        name: impl Into<String>,
        direction: PortDirection,
        kind: ParameterKind,
        protocol: ProtocolKind,
    ) -> Self {
        Self {
            port: ParameterPort {
                name: name.into(),
                direction,
                kind,
                protocol,
                config: ParameterConfig::Empty,
                optional: false,
            },
        }
    }

    /// Input port carrying `T` over protocol `P`.
    pub fn input<P: Protocol, T: ParameterValue>(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Input, T::KIND, P::KIND)
    }

    /// Output port carrying `T` over protocol `P`.
    pub fn output<P: Protocol, T: ParameterValue>(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Output, T::KIND, P::KIND)
    }

    /// Sets the value shape.
    pub fn config(mut self, config: ParameterConfig) -> Self {
        self.port.config = config;
        self
    }

    /// Marks the port as optional.
    pub fn optional(mut self) -> Self {
        self.port.optional = true;
        self
    }

    /// Port name.
    pub fn name(&self) -> &str {
        &self.port.name
    }
}

/// Typed handle to an audio input of an atomic component.
#[derive(Clone, Copy, Debug)]
pub struct AudioInput<T> {
    pub(crate) index: u32,
    width: usize,
    _sample: PhantomData<fn() -> T>,
}

/// Typed handle to an audio output of an atomic component.
#[derive(Clone, Copy, Debug)]
pub struct AudioOutput<T> {
    pub(crate) index: u32,
    width: usize,
    _sample: PhantomData<fn() -> T>,
}

impl<T: Sample> AudioInput<T> {
    pub(crate) fn new(index: u32, width: usize) -> Self {
        Self {
            index,
            width,
            _sample: PhantomData,
        }
    }

    /// Channel count.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
}

impl<T: Sample> AudioOutput<T> {
    pub(crate) fn new(index: u32, width: usize) -> Self {
        Self {
            index,
            width,
            _sample: PhantomData,
        }
    }

    /// Channel count.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Typed handle to a parameter input of an atomic component.
pub struct ParameterInput<P, T> {
    pub(crate) index: u32,
    _marker: PhantomData<fn() -> (P, T)>,
}

/// Typed handle to a parameter output of an atomic component.
pub struct ParameterOutput<P, T> {
    pub(crate) index: u32,
    _marker: PhantomData<fn() -> (P, T)>,
}

macro_rules! parameter_handle_impls {
    ($handle:ident) => {
        impl<P, T> $handle<P, T> {
            pub(crate) fn new(index: u32) -> Self {
                Self {
                    index,
                    _marker: PhantomData,
                }
            }
        }

        impl<P, T> Clone for $handle<P, T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<P, T> Copy for $handle<P, T> {}

        impl<P, T> fmt::Debug for $handle<P, T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("index", &self.index)
                    .finish()
            }
        }
    };
}

parameter_handle_impls!(ParameterInput);
parameter_handle_impls!(ParameterOutput);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ScalarParameter;
    use crate::protocol::MessageQueue;

    #[test]
    fn test_audio_spec_builder() {
        let spec = AudioPortSpec::output("out")
            .sample_type(SampleType::F64)
            .width(4)
            .optional();
        assert_eq!(spec.port.direction, PortDirection::Output);
        assert_eq!(spec.port.sample_type, SampleType::F64);
        assert_eq!(spec.port.width, Some(4));
        assert!(spec.port.optional);
        assert_eq!(AudioPortSpec::input("in").port.width, None);
    }

    #[test]
    fn test_parameter_spec_from_types() {
        let spec = ParameterPortSpec::input::<MessageQueue, ScalarParameter<i32>>("cmd");
        assert_eq!(spec.port.kind, ScalarParameter::<i32>::KIND);
        assert_eq!(spec.port.protocol, ProtocolKind::MessageQueue);
        assert_eq!(spec.port.config, ParameterConfig::Empty);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(PortDirection::Input.to_string(), "input");
        assert_eq!(PortDirection::Output.to_string(), "output");
    }
}
