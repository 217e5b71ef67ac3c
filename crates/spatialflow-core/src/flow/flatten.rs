//! Graph flattening.
//!
//! Walks every connection chain from a terminal receiver (an atomic input or
//! a top-level output) back through composite boundary ports until it reaches
//! a terminal sender (an atomic output or a top-level input). The result is
//! a flat list of direct links with no composite indirection left.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::integrity::{AudioEndpoint, IntegrityReport, Links, ViolationKind, endpoint_label};
use crate::graph::{AudioPortId, ComponentId, FlowGraph, ParameterPortId, PortDirection};

/// Direct audio link between two terminal channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatAudioLink {
    /// Atomic output or top-level input channel.
    pub sender: AudioEndpoint,
    /// Atomic input or top-level output channel.
    pub receiver: AudioEndpoint,
}

/// One terminal parameter sender and every terminal receiver it feeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatParameterLink {
    /// Atomic output or top-level input.
    pub sender: ParameterPortId,
    /// Atomic inputs or top-level outputs, in discovery order.
    pub receivers: Vec<ParameterPortId>,
}

/// Flattened view of a graph.
pub(crate) struct FlatTopology {
    /// Atomic components in declaration order, depth first.
    pub atomics: Vec<ComponentId>,
    pub audio: Vec<FlatAudioLink>,
    pub parameter: Vec<FlatParameterLink>,
}

enum Trace<E> {
    Source(E),
    Unconnected,
    Dangling(E),
    Loop,
}

/// Follows `links` from `start` until `is_source` accepts a sender.
fn trace<E: Copy + Eq + Hash>(
    links: &HashMap<E, E>,
    start: E,
    is_source: impl Fn(E) -> bool,
) -> Trace<E> {
    let mut current = start;
    // Every step consumes a distinct link unless the chain loops.
    for _ in 0..=links.len() {
        match links.get(&current) {
            None if current == start => return Trace::Unconnected,
            None => return Trace::Dangling(current),
            Some(&sender) if is_source(sender) => return Trace::Source(sender),
            Some(&sender) => current = sender,
        }
    }
    Trace::Loop
}

fn collect_atomics(graph: &FlowGraph, id: ComponentId, out: &mut Vec<ComponentId>) {
    for &child in graph.children(id) {
        if graph.is_atomic(child) {
            out.push(child);
        } else {
            collect_atomics(graph, child, out);
        }
    }
}

/// Terminal receivers: atomic inputs followed by top-level outputs.
fn terminal_owners(graph: &FlowGraph, atomics: &[ComponentId]) -> Vec<(ComponentId, PortDirection)> {
    atomics
        .iter()
        .map(|&a| (a, PortDirection::Input))
        .chain(std::iter::once((graph.root(), PortDirection::Output)))
        .collect()
}

pub(crate) fn flatten(graph: &FlowGraph, links: &Links, report: &mut IntegrityReport) -> FlatTopology {
    let mut atomics = Vec::new();
    collect_atomics(graph, graph.root(), &mut atomics);

    let root = graph.root();
    let is_terminal = |owner: ComponentId| owner == root || graph.is_atomic(owner);
    let owners = terminal_owners(graph, &atomics);

    let mut audio = Vec::new();
    for &(owner, direction) in &owners {
        for (index, port) in graph.audio_ports(owner).iter().enumerate() {
            if port.direction() != direction {
                continue;
            }
            let Some(width) = port.width() else { continue };
            let port_id = AudioPortId {
                component: owner,
                index: index as u32,
            };
            for channel in 0..width {
                let receiver = AudioEndpoint::new(port_id, channel);
                match trace(&links.audio, receiver, |e| is_terminal(e.port.component())) {
                    Trace::Source(sender) => audio.push(FlatAudioLink { sender, receiver }),
                    Trace::Unconnected if port.is_optional() => {}
                    Trace::Unconnected => {
                        report.at_audio(graph, port_id, ViolationKind::Unconnected { channel });
                    }
                    Trace::Dangling(boundary) => report.at_audio(
                        graph,
                        port_id,
                        ViolationKind::DanglingBoundary {
                            channel,
                            boundary: endpoint_label(graph, boundary),
                        },
                    ),
                    Trace::Loop => {
                        report.at_audio(graph, port_id, ViolationKind::BoundaryLoop { channel });
                    }
                }
            }
        }
    }

    let mut grouped: BTreeMap<ParameterPortId, Vec<ParameterPortId>> = BTreeMap::new();
    for &(owner, direction) in &owners {
        for (index, port) in graph.parameter_ports(owner).iter().enumerate() {
            if port.direction() != direction {
                continue;
            }
            let receiver = ParameterPortId {
                component: owner,
                index: index as u32,
            };
            match trace(&links.parameter, receiver, |p| is_terminal(p.component())) {
                Trace::Source(sender) => grouped.entry(sender).or_default().push(receiver),
                Trace::Unconnected if port.is_optional() => {}
                Trace::Unconnected => {
                    report.at_parameter(graph, receiver, ViolationKind::ParameterUnconnected);
                }
                Trace::Dangling(boundary) => report.at_parameter(
                    graph,
                    receiver,
                    ViolationKind::ParameterDangling {
                        boundary: graph.parameter_label(boundary),
                    },
                ),
                Trace::Loop => report.at_parameter(graph, receiver, ViolationKind::ParameterLoop),
            }
        }
    }

    let mut parameter = Vec::with_capacity(grouped.len());
    for (sender, receivers) in grouped {
        if let Some(port) = graph.parameter_port(sender)
            && !port.protocol().supports_fan_out()
            && receivers.len() > 1
        {
            report.at_parameter(
                graph,
                sender,
                ViolationKind::FanOutUnsupported {
                    protocol: port.protocol(),
                    receivers: receivers.len(),
                },
            );
        }
        parameter.push(FlatParameterLink { sender, receivers });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "graph_flatten: {} atomics, {} audio links, {} parameter links",
        atomics.len(),
        audio.len(),
        parameter.len()
    );

    FlatTopology {
        atomics,
        audio,
        parameter,
    }
}
