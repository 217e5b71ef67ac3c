//! Multichannel scalar gain.

use crate::error::{ComponentError, ConfigurationError};
use crate::flow::ProcessIo;
use crate::graph::{AtomicComponent, AudioInput, AudioOutput, ParameterInput, PortBuilder};
use crate::parameter::{ParameterConfig, ScalarParameter};
use crate::protocol::DoubleBuffering;

/// Applies one gain factor to every channel.
///
/// Ports: audio input `in` and output `out` (`f32`, `width` channels) and
/// an optional double-buffered `ScalarFloat` parameter input `gain`. The
/// initial gain stays in effect until a new value is published on `gain`.
#[derive(Debug)]
pub struct Gain {
    input: AudioInput<f32>,
    output: AudioOutput<f32>,
    gain_input: ParameterInput<DoubleBuffering, ScalarParameter<f32>>,
    gain: f32,
}

impl Gain {
    /// Declares the ports and creates the component.
    pub fn new(
        ports: &mut PortBuilder<'_>,
        width: usize,
        initial: f32,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            input: ports.audio_input("in", width)?,
            output: ports.audio_output("out", width)?,
            gain_input: ports.optional_parameter_input("gain", ParameterConfig::Empty)?,
            gain: initial,
        })
    }

    /// Gain applied in the last processed block.
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AtomicComponent for Gain {
    fn process(&mut self, io: &mut ProcessIo<'_>) -> Result<(), ComponentError> {
        let gain_input = io.parameter_input(&self.gain_input)?;
        if gain_input.changed() {
            self.gain = gain_input.data().value();
            gain_input.reset_changed();
        }

        let gain = self.gain;
        for ch in 0..self.input.width() {
            let (src, dst) = io.transfer(&self.input, ch, &self.output, ch);
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * gain;
            }
        }
        Ok(())
    }
}
