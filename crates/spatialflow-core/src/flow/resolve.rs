//! Assignment of audio channels to CommunicationArea rows.
//!
//! Every channel of every terminal port (top-level ports and atomic ports) is
//! an identity in a union-find. Each flat link merges its sender and receiver
//! class, and each class then receives one row in the area of its sample
//! type. Rows are handed out in a fixed order: capture channels first, then
//! atomic outputs in execution order, then atomic inputs, then playback.

use std::collections::HashMap;

use super::flatten::FlatTopology;
use super::integrity::AudioEndpoint;
use crate::graph::{AudioPortId, ComponentId, FlowGraph, PortDirection};
use crate::sample::SampleType;

/// Disjoint-set forest with path halving and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            core::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

const fn slot(sample_type: SampleType) -> usize {
    match sample_type {
        SampleType::F32 => 0,
        SampleType::F64 => 1,
    }
}

/// Row assignment for every terminal audio channel.
#[derive(Debug, Default)]
pub(crate) struct SignalMap {
    rows: HashMap<AudioEndpoint, usize>,
    counts: [usize; 2],
    /// Rows of the top-level input channels, in port then channel order.
    pub capture: Vec<usize>,
    /// Rows of the top-level output channels, in port then channel order.
    pub playback: Vec<usize>,
}

impl SignalMap {
    pub(crate) fn resolve(graph: &FlowGraph, flat: &FlatTopology, order: &[ComponentId]) -> Self {
        let root = graph.root();

        let mut endpoints: Vec<(AudioEndpoint, SampleType)> = Vec::new();
        let mut push_ports = |owner: ComponentId, direction: PortDirection| {
            for (index, port) in graph.audio_ports(owner).iter().enumerate() {
                if port.direction() != direction {
                    continue;
                }
                let id = AudioPortId {
                    component: owner,
                    index: index as u32,
                };
                for channel in 0..port.width().unwrap_or(0) {
                    endpoints.push((AudioEndpoint::new(id, channel), port.sample_type()));
                }
            }
        };
        push_ports(root, PortDirection::Input);
        for &id in order {
            push_ports(id, PortDirection::Output);
        }
        for &id in order {
            push_ports(id, PortDirection::Input);
        }
        push_ports(root, PortDirection::Output);

        let position: HashMap<AudioEndpoint, usize> = endpoints
            .iter()
            .enumerate()
            .map(|(i, &(endpoint, _))| (endpoint, i))
            .collect();

        let mut classes = UnionFind::new(endpoints.len());
        for link in &flat.audio {
            if let (Some(&s), Some(&r)) = (position.get(&link.sender), position.get(&link.receiver)) {
                classes.union(s, r);
            }
        }

        let mut map = SignalMap::default();
        let mut class_rows: HashMap<usize, usize> = HashMap::new();
        for (i, &(endpoint, sample_type)) in endpoints.iter().enumerate() {
            let class = classes.find(i);
            let counter = &mut map.counts[slot(sample_type)];
            let row = *class_rows.entry(class).or_insert_with(|| {
                *counter += 1;
                *counter - 1
            });
            map.rows.insert(endpoint, row);

            if endpoint.port.component() == root {
                match graph.audio_port(endpoint.port).map(|p| p.direction()) {
                    Some(PortDirection::Input) => map.capture.push(row),
                    Some(PortDirection::Output) => map.playback.push(row),
                    None => {}
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_resolve: {} channels in {} f32 rows and {} f64 rows",
            endpoints.len(),
            map.counts[0],
            map.counts[1]
        );

        map
    }

    /// Row of one channel.
    pub(crate) fn row(&self, endpoint: AudioEndpoint) -> Option<usize> {
        self.rows.get(&endpoint).copied()
    }

    /// Rows of every channel of `port`, in channel order.
    pub(crate) fn port_rows(&self, port: AudioPortId, width: usize) -> Vec<usize> {
        (0..width)
            .filter_map(|channel| self.row(AudioEndpoint::new(port, channel)))
            .collect()
    }

    /// Number of rows needed for `sample_type`.
    pub(crate) fn count(&self, sample_type: SampleType) -> usize {
        self.counts[slot(sample_type)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_merges_transitively() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_union_find_idempotent() {
        let mut uf = UnionFind::new(2);
        uf.union(0, 1);
        uf.union(1, 0);
        uf.union(0, 0);
        assert_eq!(uf.find(0), uf.find(1));
        let root = uf.find(0);
        assert_eq!(uf.size[root], 2);
    }

    #[test]
    fn test_sample_type_slots_distinct() {
        assert_ne!(slot(SampleType::F32), slot(SampleType::F64));
    }
}
