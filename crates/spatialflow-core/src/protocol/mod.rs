//! Communication protocols for parameter ports.
//!
//! A protocol defines how a value travels from one producer (the **output**
//! endpoint) to its consumers (the **input** endpoints):
//!
//! | protocol | readers | cross-thread | mechanism |
//! |---|---|---|---|
//! | [`DoubleBuffering`] | many | yes | `ArcSwap` front buffer, private back buffer |
//! | [`MessageQueue`] | one | yes | unbounded `crossbeam_channel` drained into a local deque |
//! | [`SharedData`] | many | no (checked) | one `Mutex` cell pinned to the first accessing thread |
//!
//! Protocols are zero-sized marker types used as type parameters of
//! [`ParameterInput`](crate::ParameterInput) and
//! [`ParameterOutput`](crate::ParameterOutput). The engine creates channels
//! through the [`ParameterRegistry`](crate::ParameterRegistry) and stores the
//! endpoints type-erased until a component asks for them by typed handle.

mod double_buffer;
mod message_queue;
mod shared_data;

use core::any::{Any, type_name};
use core::fmt;

pub use double_buffer::{DoubleBufferInput, DoubleBufferOutput, DoubleBuffering};
pub use message_queue::{MessageQueue, MessageQueueInput, MessageQueueOutput};
pub use shared_data::{SharedData, SharedDataInput, SharedDataOutput, SharedMut, SharedRef};

use crate::error::ProtocolError;
use crate::parameter::ParameterValue;

/// Runtime tag of a communication protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolKind {
    /// Front/back buffer exchange.
    DoubleBuffering,
    /// Unbounded single-consumer FIFO.
    MessageQueue,
    /// One shared value, same-thread only.
    SharedData,
}

impl ProtocolKind {
    /// Every protocol kind.
    pub const ALL: [ProtocolKind; 3] = [
        ProtocolKind::DoubleBuffering,
        ProtocolKind::MessageQueue,
        ProtocolKind::SharedData,
    ];

    /// Stable name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolKind::DoubleBuffering => "DoubleBuffering",
            ProtocolKind::MessageQueue => "MessageQueue",
            ProtocolKind::SharedData => "SharedData",
        }
    }

    /// Whether one output may feed more than one input.
    pub const fn supports_fan_out(self) -> bool {
        !matches!(self, ProtocolKind::MessageQueue)
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::DoubleBuffering {}
    impl Sealed for super::MessageQueue {}
    impl Sealed for super::SharedData {}
}

/// A communication protocol between one output and its inputs.
pub trait Protocol: sealed::Sealed + Send + Sync + 'static {
    /// Runtime tag.
    const KIND: ProtocolKind;

    /// Producer endpoint.
    type Output<T: ParameterValue>: Send + 'static;

    /// Consumer endpoint.
    type Input<T: ParameterValue>: Send + 'static;

    /// Creates a channel whose current value is `initial`.
    fn create<T: ParameterValue>(initial: T) -> Self::Output<T>;

    /// Attaches a new consumer to `output`.
    ///
    /// Fails with [`ProtocolError::FanOutUnsupported`] when the protocol is
    /// single-consumer and a consumer is already attached.
    fn connect<T: ParameterValue>(output: &mut Self::Output<T>)
    -> Result<Self::Input<T>, ProtocolError>;
}

/// A bound, type-erased endpoint.
pub(crate) struct ErasedEndpoint {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl ErasedEndpoint {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn downcast_mut<E: 'static>(&mut self) -> Result<&mut E, ProtocolError> {
        let actual = self.type_name;
        self.value
            .downcast_mut::<E>()
            .ok_or(ProtocolError::TypeMismatch {
                expected: type_name::<E>(),
                actual,
            })
    }

    /// Unwraps the endpoint, handing it back unchanged on a type mismatch.
    pub(crate) fn downcast<E: 'static>(self) -> Result<E, (Self, ProtocolError)> {
        let type_name = self.type_name;
        match self.value.downcast::<E>() {
            Ok(endpoint) => Ok(*endpoint),
            Err(value) => Err((
                Self { value, type_name },
                ProtocolError::TypeMismatch {
                    expected: core::any::type_name::<E>(),
                    actual: type_name,
                },
            )),
        }
    }
}

impl fmt::Debug for ErasedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedEndpoint")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

type ConnectFn = fn(&mut (dyn Any + Send)) -> Result<Box<dyn Any + Send>, ProtocolError>;

/// A freshly created channel whose output has not been handed out yet.
pub(crate) struct ErasedChannel {
    protocol: ProtocolKind,
    output: Box<dyn Any + Send>,
    output_type: &'static str,
    input_type: &'static str,
    connect: ConnectFn,
    receivers: usize,
}

impl ErasedChannel {
    pub(crate) fn new<P: Protocol, T: ParameterValue>(initial: T) -> Self {
        Self {
            protocol: P::KIND,
            output: Box::new(P::create(initial)),
            output_type: type_name::<P::Output<T>>(),
            input_type: type_name::<P::Input<T>>(),
            connect: connect_erased::<P, T>,
            receivers: 0,
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn receivers(&self) -> usize {
        self.receivers
    }

    /// Attaches a consumer and returns its input endpoint.
    pub(crate) fn connect(&mut self) -> Result<ErasedEndpoint, ProtocolError> {
        let value = (self.connect)(&mut *self.output)?;
        self.receivers += 1;
        Ok(ErasedEndpoint {
            value,
            type_name: self.input_type,
        })
    }

    /// Releases the producer endpoint.
    pub(crate) fn into_output(self) -> ErasedEndpoint {
        ErasedEndpoint {
            value: self.output,
            type_name: self.output_type,
        }
    }
}

fn connect_erased<P: Protocol, T: ParameterValue>(
    output: &mut (dyn Any + Send),
) -> Result<Box<dyn Any + Send>, ProtocolError> {
    let output = output
        .downcast_mut::<P::Output<T>>()
        .ok_or(ProtocolError::TypeMismatch {
            expected: type_name::<P::Output<T>>(),
            actual: "foreign channel",
        })?;
    Ok(Box::new(P::connect(output)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ScalarParameter, StringParameter};

    #[test]
    fn test_fan_out_support() {
        assert!(ProtocolKind::DoubleBuffering.supports_fan_out());
        assert!(ProtocolKind::SharedData.supports_fan_out());
        assert!(!ProtocolKind::MessageQueue.supports_fan_out());
    }

    #[test]
    fn test_erased_channel_roundtrip() {
        let mut channel =
            ErasedChannel::new::<DoubleBuffering, ScalarParameter<f32>>(ScalarParameter::new(0.5));
        assert_eq!(channel.protocol(), ProtocolKind::DoubleBuffering);
        assert_eq!(channel.receivers(), 0);
        let mut input = channel.connect().unwrap();
        assert_eq!(channel.receivers(), 1);

        let input = input
            .downcast_mut::<DoubleBufferInput<ScalarParameter<f32>>>()
            .unwrap();
        assert_eq!(input.data().value(), 0.5);
    }

    #[test]
    fn test_erased_downcast_mismatch_reports_types() {
        let mut channel = ErasedChannel::new::<MessageQueue, StringParameter>(StringParameter::default());
        let mut input = channel.connect().unwrap();
        let err = input
            .downcast_mut::<DoubleBufferInput<StringParameter>>()
            .unwrap_err();
        assert!(matches!(err, ProtocolError::TypeMismatch { .. }));

        let output = channel.into_output();
        let (output, _) = output
            .downcast::<MessageQueueOutput<ScalarParameter<f32>>>()
            .unwrap_err();
        assert!(output.type_name().contains("MessageQueueOutput"));
        assert!(output.downcast::<MessageQueueOutput<StringParameter>>().is_ok());
    }

    #[test]
    fn test_erased_message_queue_rejects_second_consumer() {
        let mut channel = ErasedChannel::new::<MessageQueue, StringParameter>(StringParameter::default());
        assert!(channel.connect().is_ok());
        assert_eq!(
            channel.connect().unwrap_err(),
            ProtocolError::FanOutUnsupported(ProtocolKind::MessageQueue)
        );
        assert_eq!(channel.receivers(), 1);
    }
}
