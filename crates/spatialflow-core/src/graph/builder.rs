//! Typed port declaration for atomic components.

use super::port::{
    AudioInput, AudioOutput, AudioPort, ParameterInput, ParameterOutput, ParameterPort,
    PortDirection,
};
use crate::context::SignalFlowContext;
use crate::error::ConfigurationError;
use crate::parameter::{ParameterConfig, ParameterValue};
use crate::protocol::Protocol;
use crate::registry::ParameterRegistry;
use crate::sample::Sample;

/// Declares the ports of an atomic component during its setup.
///
/// Handed to the closure passed to
/// [`FlowGraph::add_atomic`](super::FlowGraph::add_atomic). Every method
/// returns a typed handle the component keeps for use inside `process()`.
pub struct PortBuilder<'a> {
    path: &'a str,
    context: SignalFlowContext,
    registry: &'a ParameterRegistry,
    audio_ports: Vec<AudioPort>,
    parameter_ports: Vec<ParameterPort>,
}

impl<'a> PortBuilder<'a> {
    pub(crate) fn new(
        path: &'a str,
        context: SignalFlowContext,
        registry: &'a ParameterRegistry,
    ) -> Self {
        Self {
            path,
            context,
            registry,
            audio_ports: Vec::new(),
            parameter_ports: Vec::new(),
        }
    }

    /// Context shared by the whole graph.
    pub fn context(&self) -> SignalFlowContext {
        self.context
    }

    /// Samples per block.
    pub fn period(&self) -> usize {
        self.context.period()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.context.sample_rate()
    }

    /// Full path of the component being set up.
    pub fn path(&self) -> &str {
        self.path
    }

    /// Declares an audio input of `width` channels.
    pub fn audio_input<T: Sample>(
        &mut self,
        name: &str,
        width: usize,
    ) -> Result<AudioInput<T>, ConfigurationError> {
        let index = self.push_audio::<T>(name, PortDirection::Input, width, false)?;
        Ok(AudioInput::new(index, width))
    }

    /// Declares an audio input that reads silence when left unconnected.
    pub fn optional_audio_input<T: Sample>(
        &mut self,
        name: &str,
        width: usize,
    ) -> Result<AudioInput<T>, ConfigurationError> {
        let index = self.push_audio::<T>(name, PortDirection::Input, width, true)?;
        Ok(AudioInput::new(index, width))
    }

    /// Declares an audio output of `width` channels.
    pub fn audio_output<T: Sample>(
        &mut self,
        name: &str,
        width: usize,
    ) -> Result<AudioOutput<T>, ConfigurationError> {
        let index = self.push_audio::<T>(name, PortDirection::Output, width, false)?;
        Ok(AudioOutput::new(index, width))
    }

    /// Declares a parameter input.
    pub fn parameter_input<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
        config: ParameterConfig,
    ) -> Result<ParameterInput<P, T>, ConfigurationError> {
        let index = self.push_parameter::<P, T>(name, PortDirection::Input, config, false)?;
        Ok(ParameterInput::new(index))
    }

    /// Declares a parameter input that reads the kind's default value when
    /// left unconnected.
    pub fn optional_parameter_input<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
        config: ParameterConfig,
    ) -> Result<ParameterInput<P, T>, ConfigurationError> {
        let index = self.push_parameter::<P, T>(name, PortDirection::Input, config, true)?;
        Ok(ParameterInput::new(index))
    }

    /// Declares a parameter output.
    pub fn parameter_output<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
        config: ParameterConfig,
    ) -> Result<ParameterOutput<P, T>, ConfigurationError> {
        let index = self.push_parameter::<P, T>(name, PortDirection::Output, config, false)?;
        Ok(ParameterOutput::new(index))
    }

    pub(crate) fn into_ports(self) -> (Vec<AudioPort>, Vec<ParameterPort>) {
        (self.audio_ports, self.parameter_ports)
    }

    fn push_audio<T: Sample>(
        &mut self,
        name: &str,
        direction: PortDirection,
        width: usize,
        optional: bool,
    ) -> Result<u32, ConfigurationError> {
        let port = AudioPort {
            name: name.to_owned(),
            direction,
            sample_type: T::TYPE,
            width: Some(width),
            optional,
        };
        check_audio_port(self.path, &self.audio_ports, &port)?;
        self.audio_ports.push(port);
        Ok((self.audio_ports.len() - 1) as u32)
    }

    fn push_parameter<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
        direction: PortDirection,
        config: ParameterConfig,
        optional: bool,
    ) -> Result<u32, ConfigurationError> {
        let port = ParameterPort {
            name: name.to_owned(),
            direction,
            kind: T::KIND,
            protocol: P::KIND,
            config,
            optional,
        };
        if !self.registry.contains(T::KIND) {
            return Err(ConfigurationError::UnknownParameterKind(T::KIND));
        }
        T::from_config(&config)?;
        check_parameter_port(self.path, &self.parameter_ports, &port)?;
        self.parameter_ports.push(port);
        Ok((self.parameter_ports.len() - 1) as u32)
    }
}

pub(crate) fn check_name(name: &str) -> Result<(), ConfigurationError> {
    if name.is_empty() || name.contains('/') {
        return Err(ConfigurationError::InvalidName(name.to_owned()));
    }
    Ok(())
}

pub(crate) fn check_audio_port(
    path: &str,
    existing: &[AudioPort],
    port: &AudioPort,
) -> Result<(), ConfigurationError> {
    check_name(&port.name)?;
    if existing
        .iter()
        .any(|p| p.direction == port.direction && p.name == port.name)
    {
        return Err(ConfigurationError::DuplicatePort {
            path: path.to_owned(),
            direction: port.direction,
            category: "audio",
            name: port.name.clone(),
        });
    }
    Ok(())
}

pub(crate) fn check_parameter_port(
    path: &str,
    existing: &[ParameterPort],
    port: &ParameterPort,
) -> Result<(), ConfigurationError> {
    check_name(&port.name)?;
    if existing
        .iter()
        .any(|p| p.direction == port.direction && p.name == port.name)
    {
        return Err(ConfigurationError::DuplicatePort {
            path: path.to_owned(),
            direction: port.direction,
            category: "parameter",
            name: port.name.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{MatrixParameter, ScalarParameter};
    use crate::protocol::{DoubleBuffering, MessageQueue};

    fn context() -> SignalFlowContext {
        SignalFlowContext::new(32, 48_000).unwrap()
    }

    #[test]
    fn test_ports_indexed_in_declaration_order() {
        let registry = ParameterRegistry::new();
        let mut ports = PortBuilder::new("top/a", context(), &registry);
        let input = ports.audio_input::<f32>("in", 2).unwrap();
        let output = ports.audio_output::<f32>("out", 3).unwrap();
        let gain = ports
            .parameter_input::<DoubleBuffering, ScalarParameter<f32>>("gain", ParameterConfig::Empty)
            .unwrap();
        assert_eq!(input.index, 0);
        assert_eq!(output.index, 1);
        assert_eq!(output.width(), 3);
        assert_eq!(gain.index, 0);

        let (audio, params) = ports.into_ports();
        assert_eq!(audio.len(), 2);
        assert_eq!(params.len(), 1);
        assert_eq!(audio[1].width, Some(3));
    }

    #[test]
    fn test_same_name_allowed_across_directions() {
        let registry = ParameterRegistry::new();
        let mut ports = PortBuilder::new("top/a", context(), &registry);
        ports.audio_input::<f32>("x", 1).unwrap();
        ports.audio_output::<f32>("x", 1).unwrap();
        assert!(matches!(
            ports.audio_input::<f64>("x", 1),
            Err(ConfigurationError::DuplicatePort { .. })
        ));
    }

    #[test]
    fn test_parameter_config_validated() {
        let registry = ParameterRegistry::new();
        let mut ports = PortBuilder::new("top/a", context(), &registry);
        let result = ports.parameter_input::<DoubleBuffering, MatrixParameter<f32>>(
            "gains",
            ParameterConfig::Empty,
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidParameterConfig { .. })
        ));
    }

    #[test]
    fn test_unregistered_kind_rejected() {
        let registry = ParameterRegistry::empty();
        let mut ports = PortBuilder::new("top/a", context(), &registry);
        assert!(matches!(
            ports.parameter_output::<MessageQueue, ScalarParameter<i32>>("cmd", ParameterConfig::Empty),
            Err(ConfigurationError::UnknownParameterKind(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        assert!(check_name("").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("left").is_ok());
    }
}
