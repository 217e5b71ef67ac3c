//! Execution order of atomic components.
//!
//! Builds the audio + parameter dependency graph between atomic components
//! and sorts it with Kahn's algorithm. Ties are broken by declaration order,
//! so independent components run in the order they were added. Components
//! left over after the sort sit on or behind a cycle; each strongly connected
//! group is reported once, with one concrete cycle path.

use core::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use super::flatten::FlatTopology;
use super::integrity::{IntegrityReport, ViolationKind};
use crate::graph::{ComponentId, FlowGraph};

pub(crate) fn execution_order(
    graph: &FlowGraph,
    flat: &FlatTopology,
    report: &mut IntegrityReport,
) -> Vec<ComponentId> {
    let n = flat.atomics.len();
    let position: HashMap<ComponentId, usize> = flat
        .atomics
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut add_edge = |from: ComponentId, to: ComponentId| {
        if let (Some(&f), Some(&t)) = (position.get(&from), position.get(&to)) {
            successors[f].push(t);
        }
    };
    for link in &flat.audio {
        add_edge(link.sender.port.component(), link.receiver.port.component());
    }
    for link in &flat.parameter {
        for receiver in &link.receivers {
            add_edge(link.sender.component(), receiver.component());
        }
    }
    for list in &mut successors {
        list.sort_unstable();
        list.dedup();
    }

    let sorted = kahn_sort(&successors);

    #[cfg(feature = "tracing")]
    tracing::debug!("graph_sort: {} of {n} atomics in topo order", sorted.len());

    if sorted.len() != n {
        report_cycles(graph, flat, &successors, &sorted, report);
    }

    sorted.into_iter().map(|i| flat.atomics[i]).collect()
}

/// Performs Kahn's algorithm, lowest declaration index first.
///
/// Returns the sorted indices; nodes on or behind a cycle are missing.
fn kahn_sort(successors: &[Vec<usize>]) -> Vec<usize> {
    let n = successors.len();
    let mut in_degree = vec![0usize; n];
    for list in successors {
        for &t in list {
            in_degree[t] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut sorted = Vec::with_capacity(n);

    while let Some(Reverse(idx)) = ready.pop() {
        sorted.push(idx);
        for &t in &successors[idx] {
            in_degree[t] -= 1;
            if in_degree[t] == 0 {
                ready.push(Reverse(t));
            }
        }
    }
    sorted
}

/// Nodes reachable from `start` in one or more steps, restricted to `allowed`.
fn reachable(adjacency: &[Vec<usize>], start: usize, allowed: &[bool]) -> Vec<bool> {
    let mut seen = vec![false; adjacency.len()];
    let mut queue: VecDeque<usize> = adjacency[start]
        .iter()
        .copied()
        .filter(|&t| allowed[t])
        .collect();
    while let Some(node) = queue.pop_front() {
        if seen[node] {
            continue;
        }
        seen[node] = true;
        queue.extend(adjacency[node].iter().copied().filter(|&t| allowed[t] && !seen[t]));
    }
    seen
}

/// Shortest cycle through `start` using only nodes in `members`.
fn shortest_cycle(successors: &[Vec<usize>], start: usize, members: &[bool]) -> Vec<usize> {
    let mut parent: Vec<Option<usize>> = vec![None; successors.len()];
    let mut queue = VecDeque::from([start]);
    let mut visited = vec![false; successors.len()];
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        for &next in &successors[node] {
            if next == start {
                let mut path = vec![node];
                let mut current = node;
                while let Some(p) = parent[current] {
                    path.push(p);
                    current = p;
                }
                debug_assert_eq!(current, start);
                path.reverse();
                path.push(start);
                return path;
            }
            if members[next] && !visited[next] {
                visited[next] = true;
                parent[next] = Some(node);
                queue.push_back(next);
            }
        }
    }
    vec![start, start]
}

fn report_cycles(
    graph: &FlowGraph,
    flat: &FlatTopology,
    successors: &[Vec<usize>],
    sorted: &[usize],
    report: &mut IntegrityReport,
) {
    let n = successors.len();
    let mut remaining = vec![true; n];
    for &i in sorted {
        remaining[i] = false;
    }

    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (from, list) in successors.iter().enumerate() {
        for &to in list {
            predecessors[to].push(from);
        }
    }

    let mut reported = vec![false; n];
    for v in 0..n {
        if !remaining[v] || reported[v] {
            continue;
        }
        let forward = reachable(successors, v, &remaining);
        if !forward[v] {
            // Blocked behind a cycle, not part of one.
            continue;
        }
        let backward = reachable(&predecessors, v, &remaining);
        let members: Vec<bool> = (0..n).map(|u| forward[u] && backward[u]).collect();
        for (u, &m) in members.iter().enumerate() {
            if m {
                reported[u] = true;
            }
        }

        let cycle = shortest_cycle(successors, v, &members);
        report.at_component(
            graph,
            flat.atomics[v],
            ViolationKind::Cycle {
                members: cycle.iter().map(|&i| graph.path(flat.atomics[i])).collect(),
            },
        );
    }
}
