//! Signal-flow context and engine options.

use crate::error::ConfigurationError;

/// Block period and sample rate shared by every component of a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalFlowContext {
    period: usize,
    sample_rate: u32,
}

impl SignalFlowContext {
    /// Creates a context with `period` samples per block at `sample_rate` Hz.
    pub fn new(period: usize, sample_rate: u32) -> Result<Self, ConfigurationError> {
        if period == 0 {
            return Err(ConfigurationError::InvalidContext(
                "period must be at least one sample".into(),
            ));
        }
        if sample_rate == 0 {
            return Err(ConfigurationError::InvalidContext(
                "sample rate must be positive".into(),
            ));
        }
        Ok(Self {
            period,
            sample_rate,
        })
    }

    /// Number of samples processed per block.
    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration of one block in seconds.
    pub fn block_duration(&self) -> f64 {
        self.period as f64 / f64::from(self.sample_rate)
    }
}

/// Options applied when an [`AudioSignalFlow`](crate::AudioSignalFlow) is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowOptions {
    /// Byte alignment of every communication-area row. Power of two.
    pub alignment_bytes: usize,
}

impl FlowOptions {
    /// Largest accepted row alignment.
    pub const MAX_ALIGNMENT: usize = 4096;

    /// Checks that the options can be honoured.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let a = self.alignment_bytes;
        if !a.is_power_of_two() || !(4..=Self::MAX_ALIGNMENT).contains(&a) {
            return Err(ConfigurationError::InvalidOptions(
                format!("alignment must be a power of two in 4..={}, got {a}", Self::MAX_ALIGNMENT)
                    .into(),
            ));
        }
        Ok(())
    }
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            alignment_bytes: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_rejects_zero_period() {
        assert!(matches!(
            SignalFlowContext::new(0, 48_000),
            Err(ConfigurationError::InvalidContext(_))
        ));
        assert!(SignalFlowContext::new(64, 0).is_err());
    }

    #[test]
    fn test_block_duration() {
        let ctx = SignalFlowContext::new(480, 48_000).unwrap();
        assert!((ctx.block_duration() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_options_validation() {
        assert!(FlowOptions::default().validate().is_ok());
        assert!(FlowOptions { alignment_bytes: 4 }.validate().is_ok());
        assert!(FlowOptions { alignment_bytes: 24 }.validate().is_err());
        assert!(FlowOptions { alignment_bytes: 2 }.validate().is_err());
        assert!(FlowOptions { alignment_bytes: 8192 }.validate().is_err());
    }
}
