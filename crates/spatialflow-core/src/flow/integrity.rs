//! Integrity checking of connection descriptors.
//!
//! Every problem found is recorded as a [`Violation`] in an
//! [`IntegrityReport`]; checking never stops at the first error. This module
//! verifies each descriptor locally (scope, direction, types, widths, channel
//! ranges, fan-in) and builds the receiver-to-sender link maps that
//! flattening walks.

use core::fmt;
use std::collections::HashMap;

use thiserror::Error;

use crate::graph::{
    AudioConnection, AudioPortId, ComponentId, FlowGraph, ParameterConnection, ParameterPortId,
    PortDirection,
};
use crate::parameter::{ParameterConfig, ParameterKind};
use crate::protocol::ProtocolKind;
use crate::sample::SampleType;

/// One channel of one audio port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioEndpoint {
    /// Port.
    pub port: AudioPortId,
    /// Channel index within the port.
    pub channel: usize,
}

impl AudioEndpoint {
    /// Endpoint for `channel` of `port`.
    pub fn new(port: AudioPortId, channel: usize) -> Self {
        Self { port, channel }
    }
}

/// Reason a graph failed the integrity check.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ViolationKind {
    /// An audio port width was never set.
    #[error("width was never set")]
    WidthUnset,

    /// Top-level audio ports disagree on the sample type.
    #[error("top-level port carries {found} samples but other external ports carry {expected}")]
    ExternalSampleType {
        /// Sample type of the first top-level port.
        expected: SampleType,
        /// Sample type of this port.
        found: SampleType,
    },

    /// The sending port is out of scope or has the wrong direction.
    #[error(
        "`{port}` cannot send here: senders must be inputs of this composite or outputs of its children"
    )]
    IllegalSender {
        /// Sending port label.
        port: String,
    },

    /// The receiving port is out of scope or has the wrong direction.
    #[error(
        "`{port}` cannot receive here: receivers must be outputs of this composite or inputs of its children"
    )]
    IllegalReceiver {
        /// Receiving port label.
        port: String,
    },

    /// Connected audio ports have different sample types.
    #[error("sample type mismatch: `{sender}` carries {found}, port expects {expected}")]
    SampleTypeMismatch {
        /// Sending port label.
        sender: String,
        /// Receiver sample type.
        expected: SampleType,
        /// Sender sample type.
        found: SampleType,
    },

    /// A channel index exceeds the port width.
    #[error("channel {channel} is out of range for width {width}")]
    ChannelOutOfRange {
        /// Offending channel.
        channel: usize,
        /// Port width.
        width: usize,
    },

    /// Sender and receiver channel lists have different lengths.
    #[error(
        "connection from `{sender}` to `{receiver}` pairs {sender_count} sender channel(s) with {receiver_count} receiver channel(s)"
    )]
    ChannelCountMismatch {
        /// Sending port label.
        sender: String,
        /// Receiving port label.
        receiver: String,
        /// Length of the sender list.
        sender_count: usize,
        /// Length of the receiver list.
        receiver_count: usize,
    },

    /// Two descriptors target the same receiver channel.
    #[error("channel {channel} is fed by both `{first}` and `{second}`")]
    FanIn {
        /// Receiver channel.
        channel: usize,
        /// Sender registered first.
        first: String,
        /// Conflicting sender.
        second: String,
    },

    /// A required receiver channel (atomic input or top-level output) has no source.
    #[error("channel {channel} has no source")]
    Unconnected {
        /// Channel index.
        channel: usize,
    },

    /// A connection chain ends at a composite boundary with nothing behind it.
    #[error("channel {channel} reaches boundary `{boundary}`, which has no source")]
    DanglingBoundary {
        /// Receiver channel.
        channel: usize,
        /// Boundary endpoint label where the chain stops.
        boundary: String,
    },

    /// A connection chain loops through composite boundaries only.
    #[error("channel {channel} loops through composite boundaries without reaching a source")]
    BoundaryLoop {
        /// Receiver channel.
        channel: usize,
    },

    /// Connected parameter ports have different kinds.
    #[error("parameter kind mismatch: `{sender}` sends {found}, port expects {expected}")]
    ParameterKindMismatch {
        /// Sending port label.
        sender: String,
        /// Receiver kind.
        expected: ParameterKind,
        /// Sender kind.
        found: ParameterKind,
    },

    /// Connected parameter ports use different protocols.
    #[error("protocol mismatch: `{sender}` uses {found}, port expects {expected}")]
    ProtocolMismatch {
        /// Sending port label.
        sender: String,
        /// Receiver protocol.
        expected: ProtocolKind,
        /// Sender protocol.
        found: ProtocolKind,
    },

    /// Connected parameter ports have different configurations.
    #[error("configuration mismatch: `{sender}` has {found}, port expects {expected}")]
    ConfigMismatch {
        /// Sending port label.
        sender: String,
        /// Receiver configuration.
        expected: ParameterConfig,
        /// Sender configuration.
        found: ParameterConfig,
    },

    /// Two descriptors target the same parameter receiver.
    #[error("parameter input is fed by both `{first}` and `{second}`")]
    ParameterFanIn {
        /// Sender registered first.
        first: String,
        /// Conflicting sender.
        second: String,
    },

    /// A required parameter input has no source.
    #[error("parameter input is not connected")]
    ParameterUnconnected,

    /// A parameter chain ends at a composite boundary with nothing behind it.
    #[error("parameter input reaches boundary `{boundary}`, which has no source")]
    ParameterDangling {
        /// Boundary port label where the chain stops.
        boundary: String,
    },

    /// A parameter chain loops through composite boundaries only.
    #[error("parameter input loops through composite boundaries without reaching a source")]
    ParameterLoop,

    /// A single-consumer output feeds several receivers.
    #[error("{protocol} output feeds {receivers} receivers but the protocol allows one")]
    FanOutUnsupported {
        /// Protocol of the output.
        protocol: ProtocolKind,
        /// Number of receivers found.
        receivers: usize,
    },

    /// Atomic components depend on each other within one block.
    #[error("dependency cycle: {}", .members.join(" -> "))]
    Cycle {
        /// Component paths along the cycle, first repeated at the end.
        members: Vec<String>,
    },
}

/// One integrity problem: where it is and what is wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    component: String,
    port: Option<String>,
    kind: ViolationKind,
}

impl Violation {
    /// Creates a violation attributed to a component and, optionally, a port.
    pub fn new(component: impl Into<String>, port: Option<String>, kind: ViolationKind) -> Self {
        Self {
            component: component.into(),
            port,
            kind,
        }
    }

    /// Path of the component the violation is attributed to.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Port name, if the violation concerns one port.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Structured reason.
    pub fn kind(&self) -> &ViolationKind {
        &self.kind
    }

    /// Human-readable reason.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => write!(f, "{}.{}: {}", self.component, port, self.kind),
            None => write!(f, "{}: {}", self.component, self.kind),
        }
    }
}

/// All violations found in a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    violations: Vec<Violation>,
}

impl IntegrityReport {
    /// Whether the graph passed.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Violations in the order they were found.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Iterates over the violations.
    pub fn iter(&self) -> core::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Whether any violation matches `predicate`.
    pub fn any(&self, predicate: impl Fn(&ViolationKind) -> bool) -> bool {
        self.violations.iter().any(|v| predicate(&v.kind))
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub(crate) fn at_component(&mut self, graph: &FlowGraph, id: ComponentId, kind: ViolationKind) {
        self.push(Violation::new(graph.path(id), None, kind));
    }

    pub(crate) fn at_audio(&mut self, graph: &FlowGraph, port: AudioPortId, kind: ViolationKind) {
        let name = graph.audio_port(port).map(|p| p.name().to_owned());
        self.push(Violation::new(graph.path(port.component()), name, kind));
    }

    pub(crate) fn at_parameter(
        &mut self,
        graph: &FlowGraph,
        port: ParameterPortId,
        kind: ViolationKind,
    ) {
        let name = graph.parameter_port(port).map(|p| p.name().to_owned());
        self.push(Violation::new(graph.path(port.component()), name, kind));
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integrity check failed with {} violation(s)",
            self.violations.len()
        )?;
        for (i, v) in self.violations.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a IntegrityReport {
    type Item = &'a Violation;
    type IntoIter = core::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl IntoIterator for IntegrityReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

/// Receiver-to-sender maps built from all valid descriptors.
#[derive(Default)]
pub(crate) struct Links {
    pub audio: HashMap<AudioEndpoint, AudioEndpoint>,
    pub parameter: HashMap<ParameterPortId, ParameterPortId>,
}

pub(crate) fn endpoint_label(graph: &FlowGraph, endpoint: AudioEndpoint) -> String {
    format!("{}[{}]", graph.audio_label(endpoint.port), endpoint.channel)
}

/// Checks ports and descriptors of every composite and builds [`Links`].
pub(crate) fn collect_links(graph: &FlowGraph, report: &mut IntegrityReport) -> Links {
    check_ports(graph, report);

    let mut links = Links::default();
    for id in graph.component_ids() {
        for connection in graph.audio_connections(id) {
            check_audio_connection(graph, id, connection, &mut links, report);
        }
        for connection in graph.parameter_connections(id) {
            check_parameter_connection(graph, id, connection, &mut links, report);
        }
    }
    links
}

fn check_ports(graph: &FlowGraph, report: &mut IntegrityReport) {
    for id in graph.component_ids() {
        for port in graph.audio_ports(id).iter().filter(|p| p.width().is_none()) {
            report.push(Violation::new(
                graph.path(id),
                Some(port.name().to_owned()),
                ViolationKind::WidthUnset,
            ));
        }
    }

    let root = graph.root();
    let mut external = graph.audio_ports(root).iter();
    if let Some(first) = external.next() {
        let expected = first.sample_type();
        for port in external.filter(|p| p.sample_type() != expected) {
            report.push(Violation::new(
                graph.path(root),
                Some(port.name().to_owned()),
                ViolationKind::ExternalSampleType {
                    expected,
                    found: port.sample_type(),
                },
            ));
        }
    }
}

/// Whether a port of `owner` with `direction` may send (or receive) inside
/// `composite`.
fn in_scope(
    graph: &FlowGraph,
    composite: ComponentId,
    owner: ComponentId,
    direction: PortDirection,
    sending: bool,
) -> bool {
    let boundary = owner == composite;
    let child = graph.parent(owner) == Some(composite);
    let (boundary_dir, child_dir) = if sending {
        (PortDirection::Input, PortDirection::Output)
    } else {
        (PortDirection::Output, PortDirection::Input)
    };
    (boundary && direction == boundary_dir) || (child && direction == child_dir)
}

fn check_audio_connection(
    graph: &FlowGraph,
    composite: ComponentId,
    connection: &AudioConnection,
    links: &mut Links,
    report: &mut IntegrityReport,
) {
    let (Some(sender), Some(receiver)) = (
        graph.audio_port(connection.sender),
        graph.audio_port(connection.receiver),
    ) else {
        return;
    };

    let mut legal = true;
    if !in_scope(
        graph,
        composite,
        connection.sender.component(),
        sender.direction(),
        true,
    ) {
        report.at_component(
            graph,
            composite,
            ViolationKind::IllegalSender {
                port: graph.audio_label(connection.sender),
            },
        );
        legal = false;
    }
    if !in_scope(
        graph,
        composite,
        connection.receiver.component(),
        receiver.direction(),
        false,
    ) {
        report.at_component(
            graph,
            composite,
            ViolationKind::IllegalReceiver {
                port: graph.audio_label(connection.receiver),
            },
        );
        legal = false;
    }
    if !legal {
        return;
    }

    if sender.sample_type() != receiver.sample_type() {
        report.at_audio(
            graph,
            connection.receiver,
            ViolationKind::SampleTypeMismatch {
                sender: graph.audio_label(connection.sender),
                expected: receiver.sample_type(),
                found: sender.sample_type(),
            },
        );
        return;
    }

    // Unset widths are reported per port by `check_ports`.
    let (Some(sender_width), Some(receiver_width)) = (sender.width(), receiver.width()) else {
        return;
    };
    let sender_channels = connection.sender_channels.resolve(sender_width);
    let receiver_channels = connection.receiver_channels.resolve(receiver_width);

    let mut valid = true;
    for &channel in sender_channels.iter().filter(|&&c| c >= sender_width) {
        report.at_audio(
            graph,
            connection.sender,
            ViolationKind::ChannelOutOfRange {
                channel,
                width: sender_width,
            },
        );
        valid = false;
    }
    for &channel in receiver_channels.iter().filter(|&&c| c >= receiver_width) {
        report.at_audio(
            graph,
            connection.receiver,
            ViolationKind::ChannelOutOfRange {
                channel,
                width: receiver_width,
            },
        );
        valid = false;
    }
    if sender_channels.len() != receiver_channels.len() {
        report.at_component(
            graph,
            composite,
            ViolationKind::ChannelCountMismatch {
                sender: graph.audio_label(connection.sender),
                receiver: graph.audio_label(connection.receiver),
                sender_count: sender_channels.len(),
                receiver_count: receiver_channels.len(),
            },
        );
        valid = false;
    }
    if !valid {
        return;
    }

    for (&s, &r) in sender_channels.iter().zip(&receiver_channels) {
        let from = AudioEndpoint::new(connection.sender, s);
        let to = AudioEndpoint::new(connection.receiver, r);
        if let Some(&existing) = links.audio.get(&to) {
            report.at_audio(
                graph,
                connection.receiver,
                ViolationKind::FanIn {
                    channel: r,
                    first: endpoint_label(graph, existing),
                    second: endpoint_label(graph, from),
                },
            );
        } else {
            links.audio.insert(to, from);
        }
    }
}

fn check_parameter_connection(
    graph: &FlowGraph,
    composite: ComponentId,
    connection: &ParameterConnection,
    links: &mut Links,
    report: &mut IntegrityReport,
) {
    let (Some(sender), Some(receiver)) = (
        graph.parameter_port(connection.sender),
        graph.parameter_port(connection.receiver),
    ) else {
        return;
    };

    let mut legal = true;
    if !in_scope(
        graph,
        composite,
        connection.sender.component(),
        sender.direction(),
        true,
    ) {
        report.at_component(
            graph,
            composite,
            ViolationKind::IllegalSender {
                port: graph.parameter_label(connection.sender),
            },
        );
        legal = false;
    }
    if !in_scope(
        graph,
        composite,
        connection.receiver.component(),
        receiver.direction(),
        false,
    ) {
        report.at_component(
            graph,
            composite,
            ViolationKind::IllegalReceiver {
                port: graph.parameter_label(connection.receiver),
            },
        );
        legal = false;
    }
    if !legal {
        return;
    }

    let label = || graph.parameter_label(connection.sender);
    let mut compatible = true;
    if sender.kind() != receiver.kind() {
        report.at_parameter(
            graph,
            connection.receiver,
            ViolationKind::ParameterKindMismatch {
                sender: label(),
                expected: receiver.kind(),
                found: sender.kind(),
            },
        );
        compatible = false;
    }
    if sender.protocol() != receiver.protocol() {
        report.at_parameter(
            graph,
            connection.receiver,
            ViolationKind::ProtocolMismatch {
                sender: label(),
                expected: receiver.protocol(),
                found: sender.protocol(),
            },
        );
        compatible = false;
    }
    if sender.config() != receiver.config() {
        report.at_parameter(
            graph,
            connection.receiver,
            ViolationKind::ConfigMismatch {
                sender: label(),
                expected: receiver.config(),
                found: sender.config(),
            },
        );
        compatible = false;
    }
    if !compatible {
        return;
    }

    if let Some(&existing) = links.parameter.get(&connection.receiver) {
        report.at_parameter(
            graph,
            connection.receiver,
            ViolationKind::ParameterFanIn {
                first: graph.parameter_label(existing),
                second: label(),
            },
        );
    } else {
        links
            .parameter
            .insert(connection.receiver, connection.sender);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display_joins_violations() {
        let mut report = IntegrityReport::default();
        assert!(report.is_ok());
        report.push(Violation::new(
            "top/a",
            Some("in".into()),
            ViolationKind::Unconnected { channel: 1 },
        ));
        report.push(Violation::new(
            "top",
            None,
            ViolationKind::Cycle {
                members: vec!["top/a".into(), "top/b".into(), "top/a".into()],
            },
        ));
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.to_string(),
            "integrity check failed with 2 violation(s): \
             top/a.in: channel 1 has no source; \
             top: dependency cycle: top/a -> top/b -> top/a"
        );
    }

    #[test]
    fn test_violation_accessors() {
        let v = Violation::new("top/x", None, ViolationKind::ParameterUnconnected);
        assert_eq!(v.component(), "top/x");
        assert_eq!(v.port(), None);
        assert_eq!(v.reason(), "parameter input is not connected");
        assert_eq!(v.kind(), &ViolationKind::ParameterUnconnected);
    }
}
