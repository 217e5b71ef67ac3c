//! Channel-wise sum of several inputs.

use crate::error::{ComponentError, ConfigurationError};
use crate::flow::ProcessIo;
use crate::graph::{AtomicComponent, AudioInput, AudioOutput, PortBuilder};
use crate::sample::Sample;

/// Sums `inputs` audio inputs `in0`, `in1`, ... channel by channel into
/// `out`.
///
/// Mixing is explicit: two senders cannot share one receiver channel, so
/// signals that should be summed are routed through an `Add`.
#[derive(Debug)]
pub struct Add<T> {
    inputs: Vec<AudioInput<T>>,
    output: AudioOutput<T>,
}

impl<T: Sample> Add<T> {
    /// Declares `inputs` inputs and one output, all `width` channels wide.
    pub fn new(
        ports: &mut PortBuilder<'_>,
        inputs: usize,
        width: usize,
    ) -> Result<Self, ConfigurationError> {
        if inputs == 0 {
            return Err(ConfigurationError::setup(
                ports.path(),
                "an adder needs at least one input",
            ));
        }
        let inputs = (0..inputs)
            .map(|i| ports.audio_input(&format!("in{i}"), width))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            inputs,
            output: ports.audio_output("out", width)?,
        })
    }
}

impl<T: Sample> AtomicComponent for Add<T> {
    fn process(&mut self, io: &mut ProcessIo<'_>) -> Result<(), ComponentError> {
        let Some((first, rest)) = self.inputs.split_first() else {
            return Ok(());
        };
        for ch in 0..self.output.width() {
            let (src, dst) = io.transfer(first, ch, &self.output, ch);
            dst.copy_from_slice(src);
            for input in rest {
                let (src, dst) = io.transfer(input, ch, &self.output, ch);
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += *s;
                }
            }
        }
        Ok(())
    }
}
