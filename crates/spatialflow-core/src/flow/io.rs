//! Per-block port access for atomic components.

use super::area::CommunicationAreas;
use crate::context::SignalFlowContext;
use crate::error::ProtocolError;
use crate::graph::{AudioInput, AudioOutput, ParameterInput, ParameterOutput};
use crate::parameter::ParameterValue;
use crate::protocol::{ErasedEndpoint, Protocol};
use crate::sample::Sample;

/// Everything one scheduled component reads and writes, indexed like its
/// port lists.
#[derive(Debug, Default)]
pub(crate) struct PortBindings {
    /// Area rows of each audio port, in channel order.
    pub audio: Vec<Vec<usize>>,
    pub parameters: Vec<Option<ErasedEndpoint>>,
}

/// Port access handed to [`AtomicComponent::process`](crate::AtomicComponent::process).
///
/// Audio accessors return one block (`period` samples) of the requested
/// channel. Inputs that are not connected read silence. Handles must come
/// from the component's own [`PortBuilder`](crate::PortBuilder); a handle of
/// another component may panic or address the wrong port.
pub struct ProcessIo<'a> {
    areas: &'a mut CommunicationAreas,
    bindings: &'a mut PortBindings,
    context: SignalFlowContext,
}

impl<'a> ProcessIo<'a> {
    pub(crate) fn new(
        areas: &'a mut CommunicationAreas,
        bindings: &'a mut PortBindings,
        context: SignalFlowContext,
    ) -> Self {
        Self {
            areas,
            bindings,
            context,
        }
    }

    /// Samples per block.
    #[inline]
    pub fn period(&self) -> usize {
        self.context.period()
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate()
    }

    #[inline]
    fn row(&self, port: u32, channel: usize) -> usize {
        self.bindings.audio[port as usize][channel]
    }

    /// One block of an input channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= port.width()`.
    #[inline]
    pub fn input<T: Sample>(&self, port: &AudioInput<T>, channel: usize) -> &[T] {
        let row = self.row(port.index, channel);
        T::area(self.areas).row(row)
    }

    /// One block of an output channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= port.width()`.
    #[inline]
    pub fn output<T: Sample>(&mut self, port: &AudioOutput<T>, channel: usize) -> &mut [T] {
        let row = self.row(port.index, channel);
        T::area_mut(self.areas).row_mut(row)
    }

    /// An input channel and an output channel at the same time.
    ///
    /// # Panics
    ///
    /// Panics if either channel is out of range.
    #[inline]
    pub fn transfer<T: Sample>(
        &mut self,
        input: &AudioInput<T>,
        input_channel: usize,
        output: &AudioOutput<T>,
        output_channel: usize,
    ) -> (&[T], &mut [T]) {
        let read = self.row(input.index, input_channel);
        let write = self.row(output.index, output_channel);
        T::area_mut(self.areas).row_pair(read, write)
    }

    /// Consumer endpoint bound to a parameter input.
    pub fn parameter_input<P: Protocol, T: ParameterValue>(
        &mut self,
        port: &ParameterInput<P, T>,
    ) -> Result<&mut P::Input<T>, ProtocolError> {
        self.endpoint(port.index)?.downcast_mut::<P::Input<T>>()
    }

    /// Producer endpoint bound to a parameter output.
    pub fn parameter_output<P: Protocol, T: ParameterValue>(
        &mut self,
        port: &ParameterOutput<P, T>,
    ) -> Result<&mut P::Output<T>, ProtocolError> {
        self.endpoint(port.index)?.downcast_mut::<P::Output<T>>()
    }

    fn endpoint(&mut self, index: u32) -> Result<&mut ErasedEndpoint, ProtocolError> {
        self.bindings
            .parameters
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .ok_or(ProtocolError::Unbound)
    }
}

impl core::fmt::Debug for ProcessIo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessIo")
            .field("context", &self.context)
            .field("audio_ports", &self.bindings.audio.len())
            .finish_non_exhaustive()
    }
}
