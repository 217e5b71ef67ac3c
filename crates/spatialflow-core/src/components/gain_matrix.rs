//! Dense mixing matrix.

use crate::error::{ComponentError, ConfigurationError};
use crate::flow::ProcessIo;
use crate::graph::{AtomicComponent, AudioInput, AudioOutput, ParameterInput, PortBuilder};
use crate::parameter::{MatrixParameter, ParameterConfig};
use crate::protocol::DoubleBuffering;

/// Mixes `in` (N channels) into `out` (M channels) through an M x N gain
/// matrix: `out[m] = sum_n gains[m][n] * in[n]`.
///
/// The matrix can be replaced at run time through the optional
/// double-buffered `MatrixFloat` input `gains` (configured as
/// `Matrix { rows: M, cols: N }`). A published matrix of another shape is a
/// processing failure.
#[derive(Debug)]
pub struct GainMatrix {
    input: AudioInput<f32>,
    output: AudioOutput<f32>,
    gains_input: ParameterInput<DoubleBuffering, MatrixParameter<f32>>,
    /// Row-major, `output.width()` rows of `input.width()` gains.
    gains: Vec<f32>,
}

impl GainMatrix {
    /// Declares the ports; `initial` fixes the shape.
    pub fn new(
        ports: &mut PortBuilder<'_>,
        initial: &MatrixParameter<f32>,
    ) -> Result<Self, ConfigurationError> {
        let (rows, cols) = (initial.rows(), initial.cols());
        if rows == 0 || cols == 0 {
            return Err(ConfigurationError::setup(
                ports.path(),
                "gain matrix needs at least one row and one column",
            ));
        }
        Ok(Self {
            input: ports.audio_input("in", cols)?,
            output: ports.audio_output("out", rows)?,
            gains_input: ports
                .optional_parameter_input("gains", ParameterConfig::Matrix { rows, cols })?,
            gains: initial.as_slice().to_vec(),
        })
    }

    /// Identity routing of `channels` channels.
    pub fn identity(
        ports: &mut PortBuilder<'_>,
        channels: usize,
    ) -> Result<Self, ConfigurationError> {
        let mut gains = MatrixParameter::new(channels, channels);
        for i in 0..channels {
            gains.set(i, i, 1.0);
        }
        Self::new(ports, &gains)
    }

    /// Current gain from input `col` to output `row`.
    pub fn gain(&self, row: usize, col: usize) -> f32 {
        self.gains[row * self.input.width() + col]
    }
}

impl AtomicComponent for GainMatrix {
    fn process(&mut self, io: &mut ProcessIo<'_>) -> Result<(), ComponentError> {
        let gains_input = io.parameter_input(&self.gains_input)?;
        if gains_input.changed() {
            let update = gains_input.data();
            if update.as_slice().len() != self.gains.len() {
                return Err(ComponentError::failed(
                    "published gain matrix does not match the port shape",
                ));
            }
            self.gains.copy_from_slice(update.as_slice());
            gains_input.reset_changed();
        }

        let cols = self.input.width();
        for m in 0..self.output.width() {
            io.output(&self.output, m).fill(0.0);
            for n in 0..cols {
                let g = self.gains[m * cols + n];
                let (src, dst) = io.transfer(&self.input, n, &self.output, m);
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += g * s;
                }
            }
        }
        Ok(())
    }
}
