//! Runtime engine.
//!
//! [`AudioSignalFlow`] takes ownership of a [`FlowGraph`], runs the complete
//! setup pipeline once (integrity check, flattening, scheduling, row
//! resolution, area allocation, parameter binding) and then executes the
//! schedule once per block through [`process()`](AudioSignalFlow::process).
//!
//! # Lifecycle
//!
//! ```text
//! Unconfigured -> Configuring -> Ready -> Running -> TornDown
//!                      |                     |
//!                      +-> (error)           +-> Faulted
//! ```
//!
//! Setup failures return a [`ConfigurationError`] and no engine exists. A
//! component failure moves the engine to [`FlowState::Faulted`]; a faulted
//! engine rejects every further block.

use core::fmt;
use std::collections::{BTreeMap, HashMap};

use super::area::CommunicationAreas;
use super::flatten::{FlatAudioLink, FlatParameterLink};
use super::integrity::{AudioEndpoint, endpoint_label};
use super::io::{PortBindings, ProcessIo};
use super::resolve::SignalMap;
use crate::context::{FlowOptions, SignalFlowContext};
use crate::error::{ConfigurationError, ProcessingFault};
use crate::graph::{AudioPortId, ComponentId, FlowGraph, ParameterPortId, PortDirection};
use crate::parameter::ParameterValue;
use crate::protocol::{ErasedEndpoint, Protocol};
use crate::sample::{Sample, SampleType};

/// Lifecycle state of an [`AudioSignalFlow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowState {
    /// No setup attempted yet.
    Unconfigured,
    /// Setup pipeline running.
    Configuring,
    /// Set up; no block processed yet.
    Ready,
    /// At least one block processed.
    Running,
    /// A component failed; no further blocks are accepted.
    Faulted,
    /// Released.
    TornDown,
}

impl FlowState {
    /// Whether [`AudioSignalFlow::process`] is accepted in this state.
    pub const fn can_process(self) -> bool {
        matches!(self, FlowState::Ready | FlowState::Running)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlowState::Unconfigured => "unconfigured",
            FlowState::Configuring => "configuring",
            FlowState::Ready => "ready",
            FlowState::Running => "running",
            FlowState::Faulted => "faulted",
            FlowState::TornDown => "torn down",
        })
    }
}

/// One atomic component in execution order with its bound ports.
#[derive(Debug)]
struct ScheduledComponent {
    id: ComponentId,
    bindings: PortBindings,
}

/// A validated, flattened and scheduled signal flow.
///
/// Owns the component tree, the [`CommunicationArea`](super::CommunicationArea)s
/// and every parameter endpoint bound to an atomic component. Top-level
/// parameter endpoints are held until the application claims them with
/// [`take_parameter_output`](Self::take_parameter_output) or
/// [`take_parameter_input`](Self::take_parameter_input).
pub struct AudioSignalFlow {
    graph: FlowGraph,
    options: FlowOptions,
    state: FlowState,
    areas: CommunicationAreas,
    schedule: Vec<ScheduledComponent>,
    signals: SignalMap,
    external_type: Option<SampleType>,
    audio_links: Vec<FlatAudioLink>,
    parameter_links: Vec<FlatParameterLink>,
    /// Producers feeding top-level parameter inputs, by port name.
    external_outputs: BTreeMap<String, ErasedEndpoint>,
    /// Consumers fed by top-level parameter outputs, by port name.
    external_inputs: BTreeMap<String, ErasedEndpoint>,
}

impl AudioSignalFlow {
    /// Sets up `graph` with default [`FlowOptions`].
    ///
    /// Fails with [`ConfigurationError::Integrity`] listing every problem if
    /// the graph is not valid.
    pub fn new(graph: FlowGraph) -> Result<Self, ConfigurationError> {
        Self::with_options(graph, FlowOptions::default())
    }

    /// Sets up `graph` with explicit options.
    pub fn with_options(graph: FlowGraph, options: FlowOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        transition(&graph, FlowState::Unconfigured, FlowState::Configuring);

        let analysis = match super::analyze(&graph) {
            Ok(analysis) => analysis,
            Err(report) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("flow_setup: {} rejected, {report}", graph.path(graph.root()));
                return Err(ConfigurationError::Integrity(report));
            }
        };

        let signals = SignalMap::resolve(&graph, &analysis.flat, &analysis.order);
        let period = graph.context().period();
        let areas = CommunicationAreas::new(
            signals.count(SampleType::F32),
            signals.count(SampleType::F64),
            period,
            options.alignment_bytes,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "flow_allocate: {} f32 rows, {} f64 rows, stride {}/{} samples",
            areas.f32.rows(),
            areas.f64.rows(),
            areas.f32.stride(),
            areas.f64.stride()
        );

        let mut schedule: Vec<ScheduledComponent> = analysis
            .order
            .iter()
            .map(|&id| ScheduledComponent {
                id,
                bindings: PortBindings {
                    audio: graph
                        .audio_ports(id)
                        .iter()
                        .enumerate()
                        .map(|(index, port)| {
                            let port_id = AudioPortId {
                                component: id,
                                index: index as u32,
                            };
                            signals.port_rows(port_id, port.width().unwrap_or(0))
                        })
                        .collect(),
                    parameters: graph.parameter_ports(id).iter().map(|_| None).collect(),
                },
            })
            .collect();

        let mut binder = ParameterBinder::new(&graph, &mut schedule);
        for link in &analysis.flat.parameter {
            binder.bind_link(link)?;
        }
        binder.bind_remaining()?;
        let (external_outputs, external_inputs) = binder.into_externals();

        let external_type = graph
            .audio_ports(graph.root())
            .first()
            .map(|port| port.sample_type());

        transition(&graph, FlowState::Configuring, FlowState::Ready);

        Ok(Self {
            options,
            state: FlowState::Ready,
            areas,
            schedule,
            signals,
            external_type,
            audio_links: analysis.flat.audio,
            parameter_links: analysis.flat.parameter,
            external_outputs,
            external_inputs,
            graph,
        })
    }

    /// Processes one block.
    ///
    /// `inputs` holds one slice per top-level input channel and `outputs` one
    /// slice per top-level output channel, in port declaration then channel
    /// order; every slice holds exactly one period. Capture channels are
    /// copied in, every atomic component runs in schedule order, and playback
    /// channels are copied out.
    ///
    /// Boundary mismatches are rejected before anything runs and leave the
    /// engine usable. A component failure aborts the block and faults the
    /// engine.
    pub fn process<T: Sample>(
        &mut self,
        inputs: &[&[T]],
        outputs: &mut [&mut [T]],
    ) -> Result<(), ProcessingFault> {
        if !self.state.can_process() {
            return Err(ProcessingFault::NotRunnable(self.state));
        }
        self.check_boundary(inputs, outputs)?;

        let area = T::area_mut(&mut self.areas);
        for (&row, input) in self.signals.capture.iter().zip(inputs) {
            area.row_mut(row).copy_from_slice(input);
        }

        let context = self.graph.context();
        for entry in &mut self.schedule {
            let mut io = ProcessIo::new(&mut self.areas, &mut entry.bindings, context);
            if let Err(source) = self.graph.process_atomic(entry.id, &mut io) {
                let path = self.graph.path(entry.id);
                #[cfg(feature = "tracing")]
                tracing::warn!("flow_fault: {path} failed: {source}");
                self.state = FlowState::Faulted;
                return Err(ProcessingFault::Component { path, source });
            }
        }

        let area = T::area(&self.areas);
        for (&row, output) in self.signals.playback.iter().zip(outputs.iter_mut()) {
            output.copy_from_slice(area.row(row));
        }

        if self.state == FlowState::Ready {
            transition(&self.graph, FlowState::Ready, FlowState::Running);
            self.state = FlowState::Running;
        }
        Ok(())
    }

    fn check_boundary<T: Sample>(
        &self,
        inputs: &[&[T]],
        outputs: &[&mut [T]],
    ) -> Result<(), ProcessingFault> {
        if let Some(expected) = self.external_type
            && expected != T::TYPE
        {
            return Err(ProcessingFault::SampleTypeMismatch {
                expected,
                actual: T::TYPE,
            });
        }

        let sides = [
            (PortDirection::Input, self.signals.capture.len(), inputs.len()),
            (PortDirection::Output, self.signals.playback.len(), outputs.len()),
        ];
        for (direction, expected, actual) in sides {
            if expected != actual {
                return Err(ProcessingFault::ChannelCount {
                    direction,
                    expected,
                    actual,
                });
            }
        }

        let period = self.graph.context().period();
        let lengths = inputs
            .iter()
            .map(|s| s.len())
            .enumerate()
            .map(|(channel, len)| (PortDirection::Input, channel, len))
            .chain(
                outputs
                    .iter()
                    .map(|s| s.len())
                    .enumerate()
                    .map(|(channel, len)| (PortDirection::Output, channel, len)),
            );
        for (direction, channel, actual) in lengths {
            if actual != period {
                return Err(ProcessingFault::BlockLength {
                    direction,
                    channel,
                    expected: period,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Block period and sample rate.
    pub fn context(&self) -> SignalFlowContext {
        self.graph.context()
    }

    /// Options the engine was built with.
    pub fn options(&self) -> FlowOptions {
        self.options
    }

    /// The component tree, for introspection.
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Atomic components in execution order.
    pub fn schedule_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.schedule.iter().map(|entry| entry.id)
    }

    /// Paths of the atomic components in execution order.
    pub fn schedule(&self) -> Vec<String> {
        self.schedule_ids().map(|id| self.graph.path(id)).collect()
    }

    /// Number of top-level input channels.
    pub fn capture_width(&self) -> usize {
        self.signals.capture.len()
    }

    /// Number of top-level output channels.
    pub fn playback_width(&self) -> usize {
        self.signals.playback.len()
    }

    /// Sample type of the top-level audio ports, if there are any.
    pub fn external_sample_type(&self) -> Option<SampleType> {
        self.external_type
    }

    /// Number of rows allocated for `sample_type`.
    pub fn signal_count(&self, sample_type: SampleType) -> usize {
        self.signals.count(sample_type)
    }

    /// Row assigned to `channel` of an atomic or top-level audio port.
    ///
    /// Connected channels share a row. Returns `None` for ports of nested
    /// composites, which carry no storage.
    pub fn row_of(&self, port: AudioPortId, channel: usize) -> Option<usize> {
        self.signals.row(AudioEndpoint::new(port, channel))
    }

    /// Storage of all audio signals.
    pub fn areas(&self) -> &CommunicationAreas {
        &self.areas
    }

    /// Flattened audio links.
    pub fn audio_links(&self) -> &[FlatAudioLink] {
        &self.audio_links
    }

    /// Flattened parameter links.
    pub fn parameter_links(&self) -> &[FlatParameterLink] {
        &self.parameter_links
    }

    /// Flattened audio links as `(sender, receiver)` labels such as
    /// `top/gain.out[1]`.
    pub fn audio_connections(&self) -> Vec<(String, String)> {
        self.audio_links
            .iter()
            .map(|link| {
                (
                    endpoint_label(&self.graph, link.sender),
                    endpoint_label(&self.graph, link.receiver),
                )
            })
            .collect()
    }

    /// Flattened parameter links as `(sender, receivers)` labels.
    pub fn parameter_connections(&self) -> Vec<(String, Vec<String>)> {
        self.parameter_links
            .iter()
            .map(|link| {
                (
                    self.graph.parameter_label(link.sender),
                    link.receivers
                        .iter()
                        .map(|&r| self.graph.parameter_label(r))
                        .collect(),
                )
            })
            .collect()
    }

    /// Claims the producer endpoint feeding the top-level parameter input
    /// `name`.
    ///
    /// Each endpoint can be taken once. Fails with
    /// [`ConfigurationError::UnknownExternalParameter`] if there is no such
    /// unclaimed port, or with a protocol type mismatch if `P` and `T` differ
    /// from the port's declaration.
    pub fn take_parameter_output<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
    ) -> Result<P::Output<T>, ConfigurationError> {
        take(&mut self.external_outputs, PortDirection::Input, name)
    }

    /// Claims the consumer endpoint fed by the top-level parameter output
    /// `name`.
    pub fn take_parameter_input<P: Protocol, T: ParameterValue>(
        &mut self,
        name: &str,
    ) -> Result<P::Input<T>, ConfigurationError> {
        take(&mut self.external_inputs, PortDirection::Output, name)
    }

    /// Releases the engine and hands back the component tree.
    ///
    /// Every parameter endpoint held by the engine is dropped.
    pub fn teardown(mut self) -> FlowGraph {
        transition(&self.graph, self.state, FlowState::TornDown);
        self.state = FlowState::TornDown;
        self.graph
    }
}

impl fmt::Debug for AudioSignalFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSignalFlow")
            .field("state", &self.state)
            .field("context", &self.graph.context())
            .field("components", &self.schedule.len())
            .field("capture", &self.signals.capture.len())
            .field("playback", &self.signals.playback.len())
            .finish_non_exhaustive()
    }
}

fn take<E: 'static>(
    endpoints: &mut BTreeMap<String, ErasedEndpoint>,
    direction: PortDirection,
    name: &str,
) -> Result<E, ConfigurationError> {
    let endpoint = endpoints
        .remove(name)
        .ok_or_else(|| ConfigurationError::UnknownExternalParameter {
            direction,
            name: name.to_owned(),
        })?;
    endpoint.downcast::<E>().map_err(|(endpoint, err)| {
        endpoints.insert(name.to_owned(), endpoint);
        ConfigurationError::Protocol(err)
    })
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn transition(graph: &FlowGraph, from: FlowState, to: FlowState) {
    #[cfg(feature = "tracing")]
    tracing::debug!("flow_state: {} {from} -> {to}", graph.path(graph.root()));
}

/// Creates one channel per terminal parameter sender and hands its
/// endpoints to the scheduled components or the top-level endpoint maps.
struct ParameterBinder<'g, 's> {
    graph: &'g FlowGraph,
    schedule: &'s mut [ScheduledComponent],
    position: HashMap<ComponentId, usize>,
    external_outputs: BTreeMap<String, ErasedEndpoint>,
    external_inputs: BTreeMap<String, ErasedEndpoint>,
}

impl<'g, 's> ParameterBinder<'g, 's> {
    fn new(graph: &'g FlowGraph, schedule: &'s mut [ScheduledComponent]) -> Self {
        let position = schedule
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();
        Self {
            graph,
            schedule,
            position,
            external_outputs: BTreeMap::new(),
            external_inputs: BTreeMap::new(),
        }
    }

    fn create_channel(
        &self,
        port: ParameterPortId,
    ) -> Result<crate::protocol::ErasedChannel, ConfigurationError> {
        let declared = self
            .graph
            .parameter_port(port)
            .ok_or_else(|| ConfigurationError::ForeignPort(format!("{port:?}")))?;
        self.graph
            .registry()
            .create_channel(declared.kind(), declared.protocol(), &declared.config())
    }

    fn place(&mut self, port: ParameterPortId, endpoint: ErasedEndpoint) {
        let owner = port.component();
        if owner == self.graph.root() {
            let Some(declared) = self.graph.parameter_port(port) else {
                return;
            };
            let name = declared.name().to_owned();
            match declared.direction() {
                PortDirection::Input => self.external_outputs.insert(name, endpoint),
                PortDirection::Output => self.external_inputs.insert(name, endpoint),
            };
        } else if let Some(&i) = self.position.get(&owner)
            && let Some(slot) = self.schedule[i].bindings.parameters.get_mut(port.index())
        {
            *slot = Some(endpoint);
        }
    }

    fn is_bound(&self, port: ParameterPortId) -> bool {
        let owner = port.component();
        if owner == self.graph.root() {
            self.graph.parameter_port(port).is_some_and(|declared| {
                let name = declared.name();
                match declared.direction() {
                    PortDirection::Input => self.external_outputs.contains_key(name),
                    PortDirection::Output => self.external_inputs.contains_key(name),
                }
            })
        } else {
            self.position.get(&owner).is_some_and(|&i| {
                self.schedule[i]
                    .bindings
                    .parameters
                    .get(port.index())
                    .is_some_and(Option::is_some)
            })
        }
    }

    fn bind_link(&mut self, link: &FlatParameterLink) -> Result<(), ConfigurationError> {
        let mut channel = self.create_channel(link.sender)?;
        for &receiver in &link.receivers {
            let input = channel.connect()?;
            self.place(receiver, input);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "flow_bind: {} ({}) -> {} receiver(s)",
            self.graph.parameter_label(link.sender),
            channel.protocol(),
            channel.receivers()
        );

        self.place(link.sender, channel.into_output());
        Ok(())
    }

    /// Gives every port without a link a private channel, so unconnected
    /// inputs read the default value and unconnected outputs write nowhere.
    fn bind_remaining(&mut self) -> Result<(), ConfigurationError> {
        let root = self.graph.root();
        let owners: Vec<ComponentId> = core::iter::once(root)
            .chain(self.schedule.iter().map(|entry| entry.id))
            .collect();

        for owner in owners {
            for (index, declared) in self.graph.parameter_ports(owner).iter().enumerate() {
                let port = ParameterPortId {
                    component: owner,
                    index: index as u32,
                };
                if self.is_bound(port) {
                    continue;
                }
                let receives = (declared.direction() == PortDirection::Input) != (owner == root);
                let mut channel = self.create_channel(port)?;
                let endpoint = if receives {
                    channel.connect()?
                } else {
                    channel.into_output()
                };
                self.place(port, endpoint);
            }
        }
        Ok(())
    }

    fn into_externals(
        self,
    ) -> (
        BTreeMap<String, ErasedEndpoint>,
        BTreeMap<String, ErasedEndpoint>,
    ) {
        (self.external_outputs, self.external_inputs)
    }
}
