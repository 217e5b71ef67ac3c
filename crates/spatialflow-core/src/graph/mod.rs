//! Component/port graph model.
//!
//! A [`FlowGraph`] is an arena of components addressed by [`ComponentId`].
//! Index 0 is the top-level composite created by [`FlowGraph::new`]; every
//! other component has exactly one parent composite, stored as an id so the
//! tree stays acyclic and ownership flows strictly from the arena.
//!
//! # Building a graph
//!
//! 1. Create the graph with a [`SignalFlowContext`] and a shared
//!    [`ParameterRegistry`].
//! 2. Add nested composites with [`add_composite`](FlowGraph::add_composite)
//!    and atomic components with [`add_atomic`](FlowGraph::add_atomic).
//! 3. Declare boundary ports on composites with
//!    [`add_audio_port`](FlowGraph::add_audio_port) and
//!    [`add_parameter_port`](FlowGraph::add_parameter_port). Widths left unset
//!    can be filled in once with
//!    [`set_audio_port_width`](FlowGraph::set_audio_port_width).
//! 4. Register connections on the composite that contains them with
//!    [`connect_audio`](FlowGraph::connect_audio) and
//!    [`connect_parameter`](FlowGraph::connect_parameter).
//! 5. Hand the graph to [`AudioSignalFlow::new`](crate::AudioSignalFlow::new).
//!
//! Only obvious API misuse (unknown ids, duplicate names, connections on an
//! atomic component) fails immediately. Everything else is collected by the
//! integrity check so that all problems are reported together; see
//! [`check_integrity`](FlowGraph::check_integrity).

mod builder;
mod component;
mod connection;
mod port;

use core::fmt;
use std::sync::Arc;

pub use builder::PortBuilder;
pub use component::{AtomicComponent, ComponentKind};
pub use connection::{AudioConnection, ChannelList, ParameterConnection};
pub use port::{
    AudioInput, AudioOutput, AudioPort, AudioPortId, AudioPortSpec, ParameterInput,
    ParameterOutput, ParameterPort, ParameterPortId, ParameterPortSpec, PortDirection,
};

pub(crate) use component::{ComponentBody, ComponentNode, CompositeBody};

use crate::context::SignalFlowContext;
use crate::error::{ComponentError, ConfigurationError};
use crate::flow::{IntegrityReport, ProcessIo};
use crate::registry::ParameterRegistry;

/// Unique identifier for a component in a [`FlowGraph`].
///
/// Ids are assigned sequentially and never reused within a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Hierarchy of components, ports and connection descriptors.
pub struct FlowGraph {
    context: SignalFlowContext,
    registry: Arc<ParameterRegistry>,
    nodes: Vec<ComponentNode>,
}

impl FlowGraph {
    /// Creates a graph whose top-level composite is called `name`.
    pub fn new(
        name: impl Into<String>,
        context: SignalFlowContext,
        registry: Arc<ParameterRegistry>,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        builder::check_name(&name)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_new: `{name}` period={} sample_rate={}",
            context.period(),
            context.sample_rate()
        );

        Ok(Self {
            context,
            registry,
            nodes: vec![ComponentNode {
                name,
                parent: None,
                audio_ports: Vec::new(),
                parameter_ports: Vec::new(),
                body: ComponentBody::Composite(CompositeBody::default()),
            }],
        })
    }

    /// The top-level composite.
    #[inline]
    pub fn root(&self) -> ComponentId {
        ComponentId(0)
    }

    /// Context shared by every component.
    #[inline]
    pub fn context(&self) -> SignalFlowContext {
        self.context
    }

    /// Registry used to create parameter channels.
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    // --- Construction ---

    /// Adds an empty composite child to `parent`.
    pub fn add_composite(
        &mut self,
        parent: ComponentId,
        name: impl Into<String>,
    ) -> Result<ComponentId, ConfigurationError> {
        let name = name.into();
        self.check_new_child(parent, &name)?;
        let id = self.push_child(
            parent,
            ComponentNode {
                name,
                parent: Some(parent),
                audio_ports: Vec::new(),
                parameter_ports: Vec::new(),
                body: ComponentBody::Composite(CompositeBody::default()),
            },
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: composite `{}` {id}", self.path(id));

        Ok(id)
    }

    /// Adds an atomic child to `parent`.
    ///
    /// `setup` runs exactly once: it declares the component's ports on the
    /// [`PortBuilder`] and returns the component instance.
    pub fn add_atomic<C, F>(
        &mut self,
        parent: ComponentId,
        name: impl Into<String>,
        setup: F,
    ) -> Result<ComponentId, ConfigurationError>
    where
        C: AtomicComponent,
        F: FnOnce(&mut PortBuilder<'_>) -> Result<C, ConfigurationError>,
    {
        let name = name.into();
        self.check_new_child(parent, &name)?;
        let path = format!("{}/{name}", self.path(parent));

        let mut ports = PortBuilder::new(&path, self.context, &self.registry);
        let component = setup(&mut ports)?;
        let (audio_ports, parameter_ports) = ports.into_ports();

        let id = self.push_child(
            parent,
            ComponentNode {
                name,
                parent: Some(parent),
                audio_ports,
                parameter_ports,
                body: ComponentBody::Atomic {
                    component: Box::new(component),
                    type_name: core::any::type_name::<C>(),
                },
            },
        );

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: atomic `{path}` {id}");

        Ok(id)
    }

    /// Declares an audio boundary port on a composite.
    pub fn add_audio_port(
        &mut self,
        composite: ComponentId,
        spec: AudioPortSpec,
    ) -> Result<AudioPortId, ConfigurationError> {
        self.composite_body(composite)?;
        let path = self.path(composite);
        let node = self.node_mut(composite);
        builder::check_audio_port(&path, &node.audio_ports, &spec.port)?;
        node.audio_ports.push(spec.port);
        Ok(AudioPortId {
            component: composite,
            index: (node.audio_ports.len() - 1) as u32,
        })
    }

    /// Declares a parameter boundary port on a composite.
    pub fn add_parameter_port(
        &mut self,
        composite: ComponentId,
        spec: ParameterPortSpec,
    ) -> Result<ParameterPortId, ConfigurationError> {
        self.composite_body(composite)?;
        self.registry.validate(spec.port.kind, &spec.port.config)?;
        let path = self.path(composite);
        let node = self.node_mut(composite);
        builder::check_parameter_port(&path, &node.parameter_ports, &spec.port)?;
        node.parameter_ports.push(spec.port);
        Ok(ParameterPortId {
            component: composite,
            index: (node.parameter_ports.len() - 1) as u32,
        })
    }

    /// Sets the width of a port declared without one.
    ///
    /// Widths are fixed once set; the graph itself is immutable once handed
    /// to an engine.
    pub fn set_audio_port_width(
        &mut self,
        port: AudioPortId,
        width: usize,
    ) -> Result<(), ConfigurationError> {
        self.check_audio_port_id(port)?;
        let path = self.path(port.component);
        let entry = &mut self.node_mut(port.component).audio_ports[port.index()];
        if let Some(current) = entry.width {
            return Err(ConfigurationError::WidthAlreadySet {
                path,
                port: entry.name.clone(),
                width: current,
            });
        }
        entry.width = Some(width);
        Ok(())
    }

    /// Registers an audio connection inside `composite`.
    ///
    /// The sender must be an input of `composite` or an output of one of its
    /// children; the receiver an output of `composite` or an input of a
    /// child. Scope, types, widths and channel ranges are verified by the
    /// integrity check.
    pub fn connect_audio(
        &mut self,
        composite: ComponentId,
        sender: AudioPortId,
        sender_channels: impl Into<ChannelList>,
        receiver: AudioPortId,
        receiver_channels: impl Into<ChannelList>,
    ) -> Result<(), ConfigurationError> {
        self.composite_body(composite)?;
        self.check_audio_port_id(sender)?;
        self.check_audio_port_id(receiver)?;
        let connection = AudioConnection {
            sender,
            sender_channels: sender_channels.into(),
            receiver,
            receiver_channels: receiver_channels.into(),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_connect: {}{} → {}{}",
            self.audio_label(sender),
            connection.sender_channels,
            self.audio_label(receiver),
            connection.receiver_channels
        );

        if let Some(body) = self.node_mut(composite).composite_mut() {
            body.audio_connections.push(connection);
        }
        Ok(())
    }

    /// Registers a parameter connection inside `composite`.
    pub fn connect_parameter(
        &mut self,
        composite: ComponentId,
        sender: ParameterPortId,
        receiver: ParameterPortId,
    ) -> Result<(), ConfigurationError> {
        self.composite_body(composite)?;
        self.check_parameter_port_id(sender)?;
        self.check_parameter_port_id(receiver)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_connect: {} → {}",
            self.parameter_label(sender),
            self.parameter_label(receiver)
        );

        if let Some(body) = self.node_mut(composite).composite_mut() {
            body.parameter_connections
                .push(ParameterConnection { sender, receiver });
        }
        Ok(())
    }

    // --- Port lookup ---

    /// Finds an audio port by direction and name.
    pub fn find_audio_port(
        &self,
        component: ComponentId,
        direction: PortDirection,
        name: &str,
    ) -> Result<AudioPortId, ConfigurationError> {
        self.check_component(component)?;
        self.node(component)
            .audio_ports
            .iter()
            .position(|p| p.direction == direction && p.name == name)
            .map(|index| AudioPortId {
                component,
                index: index as u32,
            })
            .ok_or_else(|| ConfigurationError::UnknownPort {
                path: self.path(component),
                direction,
                category: "audio",
                name: name.to_owned(),
            })
    }

    /// Finds a parameter port by direction and name.
    pub fn find_parameter_port(
        &self,
        component: ComponentId,
        direction: PortDirection,
        name: &str,
    ) -> Result<ParameterPortId, ConfigurationError> {
        self.check_component(component)?;
        self.node(component)
            .parameter_ports
            .iter()
            .position(|p| p.direction == direction && p.name == name)
            .map(|index| ParameterPortId {
                component,
                index: index as u32,
            })
            .ok_or_else(|| ConfigurationError::UnknownPort {
                path: self.path(component),
                direction,
                category: "parameter",
                name: name.to_owned(),
            })
    }

    /// Shorthand for [`find_audio_port`](Self::find_audio_port) on an input.
    pub fn audio_input(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<AudioPortId, ConfigurationError> {
        self.find_audio_port(component, PortDirection::Input, name)
    }

    /// Shorthand for [`find_audio_port`](Self::find_audio_port) on an output.
    pub fn audio_output(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<AudioPortId, ConfigurationError> {
        self.find_audio_port(component, PortDirection::Output, name)
    }

    /// Shorthand for [`find_parameter_port`](Self::find_parameter_port) on an input.
    pub fn parameter_input(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<ParameterPortId, ConfigurationError> {
        self.find_parameter_port(component, PortDirection::Input, name)
    }

    /// Shorthand for [`find_parameter_port`](Self::find_parameter_port) on an output.
    pub fn parameter_output(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<ParameterPortId, ConfigurationError> {
        self.find_parameter_port(component, PortDirection::Output, name)
    }

    // --- Introspection ---

    /// Number of components, including the top level.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the top-level composite always exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All component ids in creation order.
    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        (0..self.nodes.len() as u32).map(ComponentId)
    }

    /// Component name.
    pub fn name(&self, id: ComponentId) -> &str {
        &self.node(id).name
    }

    /// Slash-separated path from the top level, e.g. `renderer/panner`.
    pub fn path(&self, id: ComponentId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c);
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Finds a component by its path.
    pub fn find(&self, path: &str) -> Option<ComponentId> {
        let mut segments = path.split('/');
        let root = self.root();
        if segments.next()? != self.name(root) {
            return None;
        }
        let mut current = root;
        for segment in segments {
            let body = self.node(current).composite()?;
            current = body
                .children
                .iter()
                .copied()
                .find(|&c| self.name(c) == segment)?;
        }
        Some(current)
    }

    /// Parent composite, `None` for the top level.
    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.node(id).parent
    }

    /// Children in declaration order; empty for atomic components.
    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.node(id)
            .composite()
            .map(|body| body.children.as_slice())
            .unwrap_or(&[])
    }

    /// Atomic or composite.
    pub fn kind(&self, id: ComponentId) -> ComponentKind {
        self.node(id).kind()
    }

    /// Whether the component is atomic.
    pub fn is_atomic(&self, id: ComponentId) -> bool {
        self.kind(id) == ComponentKind::Atomic
    }

    /// Rust type of an atomic component.
    pub fn type_name(&self, id: ComponentId) -> Option<&'static str> {
        match &self.node(id).body {
            ComponentBody::Atomic { type_name, .. } => Some(*type_name),
            ComponentBody::Composite(_) => None,
        }
    }

    /// Audio ports of a component in declaration order.
    pub fn audio_ports(&self, id: ComponentId) -> &[AudioPort] {
        &self.node(id).audio_ports
    }

    /// Parameter ports of a component in declaration order.
    pub fn parameter_ports(&self, id: ComponentId) -> &[ParameterPort] {
        &self.node(id).parameter_ports
    }

    /// Looks up an audio port.
    pub fn audio_port(&self, id: AudioPortId) -> Option<&AudioPort> {
        self.nodes
            .get(id.component.0 as usize)?
            .audio_ports
            .get(id.index())
    }

    /// Looks up a parameter port.
    pub fn parameter_port(&self, id: ParameterPortId) -> Option<&ParameterPort> {
        self.nodes
            .get(id.component.0 as usize)?
            .parameter_ports
            .get(id.index())
    }

    /// Audio connections registered on a composite.
    pub fn audio_connections(&self, id: ComponentId) -> &[AudioConnection] {
        self.node(id)
            .composite()
            .map(|body| body.audio_connections.as_slice())
            .unwrap_or(&[])
    }

    /// Parameter connections registered on a composite.
    pub fn parameter_connections(&self, id: ComponentId) -> &[ParameterConnection] {
        self.node(id)
            .composite()
            .map(|body| body.parameter_connections.as_slice())
            .unwrap_or(&[])
    }

    /// `path.port` label of an audio port.
    pub fn audio_label(&self, id: AudioPortId) -> String {
        match self.audio_port(id) {
            Some(port) => format!("{}.{}", self.path(id.component), port.name),
            None => format!("{}.#{}", id.component, id.index),
        }
    }

    /// `path.port` label of a parameter port.
    pub fn parameter_label(&self, id: ParameterPortId) -> String {
        match self.parameter_port(id) {
            Some(port) => format!("{}.{}", self.path(id.component), port.name),
            None => format!("{}.#{}", id.component, id.index),
        }
    }

    /// Runs the complete integrity check without consuming the graph.
    ///
    /// An empty report means [`AudioSignalFlow::new`](crate::AudioSignalFlow::new)
    /// will accept the graph.
    pub fn check_integrity(&self) -> IntegrityReport {
        match crate::flow::analyze(self) {
            Ok(_) => IntegrityReport::default(),
            Err(report) => report,
        }
    }

    // --- Crate internals ---

    pub(crate) fn node(&self, id: ComponentId) -> &ComponentNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: ComponentId) -> &mut ComponentNode {
        &mut self.nodes[id.0 as usize]
    }

    pub(crate) fn process_atomic(
        &mut self,
        id: ComponentId,
        io: &mut ProcessIo<'_>,
    ) -> Result<(), ComponentError> {
        match &mut self.nodes[id.0 as usize].body {
            ComponentBody::Atomic { component, .. } => component.process(io),
            ComponentBody::Composite(_) => Ok(()),
        }
    }

    fn check_component(&self, id: ComponentId) -> Result<(), ConfigurationError> {
        if (id.0 as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownComponent(id))
        }
    }

    fn composite_body(&self, id: ComponentId) -> Result<&CompositeBody, ConfigurationError> {
        self.check_component(id)?;
        self.node(id)
            .composite()
            .ok_or_else(|| ConfigurationError::NotComposite(self.path(id)))
    }

    fn check_new_child(&self, parent: ComponentId, name: &str) -> Result<(), ConfigurationError> {
        builder::check_name(name)?;
        let body = self.composite_body(parent)?;
        if body.children.iter().any(|&c| self.name(c) == name) {
            return Err(ConfigurationError::DuplicateName {
                parent: self.path(parent),
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn push_child(&mut self, parent: ComponentId, node: ComponentNode) -> ComponentId {
        let id = ComponentId(self.nodes.len() as u32);
        self.nodes.push(node);
        if let Some(body) = self.node_mut(parent).composite_mut() {
            body.children.push(id);
        }
        id
    }

    fn check_audio_port_id(&self, id: AudioPortId) -> Result<(), ConfigurationError> {
        self.audio_port(id)
            .map(|_| ())
            .ok_or_else(|| ConfigurationError::ForeignPort(format!("{id:?}")))
    }

    fn check_parameter_port_id(&self, id: ParameterPortId) -> Result<(), ConfigurationError> {
        self.parameter_port(id)
            .map(|_| ())
            .ok_or_else(|| ConfigurationError::ForeignPort(format!("{id:?}")))
    }
}

impl fmt::Debug for FlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowGraph")
            .field("context", &self.context)
            .field("components", &self.nodes.len())
            .finish_non_exhaustive()
    }
}
