//! Property-based tests for spatialflow-core.
//!
//! Randomized routing topologies and signals: identity round trips, fan-out,
//! channel permutations, execution order of chains and message ordering.

use std::sync::Arc;

use proptest::prelude::*;
use spatialflow_core::components::Gain;
use spatialflow_core::{
    AudioPortSpec, AudioSignalFlow, FlowGraph, MessageQueue, ParameterRegistry, Protocol,
    ScalarParameter, SignalFlowContext,
};

const PERIOD: usize = 32;

fn new_graph() -> FlowGraph {
    let context = SignalFlowContext::new(PERIOD, 48_000).unwrap();
    FlowGraph::new("top", context, Arc::new(ParameterRegistry::new())).unwrap()
}

fn run(flow: &mut AudioSignalFlow, inputs: &[Vec<f32>], outputs: usize) -> Vec<Vec<f32>> {
    let ins: Vec<&[f32]> = inputs.iter().map(Vec::as_slice).collect();
    let mut outs = vec![vec![0.0_f32; PERIOD]; outputs];
    {
        let mut refs: Vec<&mut [f32]> = outs.iter_mut().map(Vec::as_mut_slice).collect();
        flow.process::<f32>(&ins, &mut refs).unwrap();
    }
    outs
}

/// `width` channels of one block each.
fn blocks(width: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..=1.0f32, PERIOD), width)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any signal routed straight from capture to playback comes back
    /// bit-identical, block after block.
    #[test]
    fn round_trip_identity(first in blocks(1..8), second in blocks(1..8)) {
        let width = first.len();
        let mut graph = new_graph();
        let root = graph.root();
        let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(width)).unwrap();
        let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(width)).unwrap();
        graph.connect_audio(root, input, .., output, ..).unwrap();
        let mut flow = AudioSignalFlow::new(graph).unwrap();

        prop_assert_eq!(&run(&mut flow, &first, width), &first);
        // Second block with a possibly different width is truncated or
        // padded to fit the ports.
        let mut next = second;
        next.resize(width, vec![0.25; PERIOD]);
        prop_assert_eq!(&run(&mut flow, &next, width), &next);
    }

    /// Every receiver of a fanned-out channel reads the sender's samples.
    #[test]
    fn fan_out_identical(receivers in 2usize..8, signal in blocks(1..2)) {
        let mut graph = new_graph();
        let root = graph.root();
        let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(1)).unwrap();
        let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(receivers)).unwrap();
        let source = graph.add_atomic(root, "source", |ports| Gain::new(ports, 1, 1.0)).unwrap();
        let source_in = graph.audio_input(source, "in").unwrap();
        let source_out = graph.audio_output(source, "out").unwrap();
        graph.connect_audio(root, input, .., source_in, ..).unwrap();
        for i in 0..receivers {
            let gain = graph.add_atomic(root, format!("g{i}"), |ports| Gain::new(ports, 1, 1.0)).unwrap();
            let gain_in = graph.audio_input(gain, "in").unwrap();
            let gain_out = graph.audio_output(gain, "out").unwrap();
            graph.connect_audio(root, source_out, .., gain_in, ..).unwrap();
            graph.connect_audio(root, gain_out, .., output, i).unwrap();
        }
        let mut flow = AudioSignalFlow::new(graph).unwrap();

        let outputs = run(&mut flow, &signal, receivers);
        for out in &outputs {
            prop_assert_eq!(out, &signal[0]);
        }
    }

    /// Explicit channel lists route `in[perm[i]]` to `out[i]`.
    #[test]
    fn channel_permutation(
        perm in (1usize..8).prop_flat_map(|w| Just((0..w).collect::<Vec<usize>>()).prop_shuffle()),
    ) {
        let width = perm.len();
        let mut graph = new_graph();
        let root = graph.root();
        let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(width)).unwrap();
        let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(width)).unwrap();
        let gain = graph.add_atomic(root, "gain", move |ports| Gain::new(ports, width, 1.0)).unwrap();
        let gain_in = graph.audio_input(gain, "in").unwrap();
        let gain_out = graph.audio_output(gain, "out").unwrap();
        graph.connect_audio(root, input, perm.clone(), gain_in, ..).unwrap();
        graph.connect_audio(root, gain_out, .., output, ..).unwrap();
        let mut flow = AudioSignalFlow::new(graph).unwrap();

        let inputs: Vec<Vec<f32>> = (0..width).map(|ch| vec![ch as f32; PERIOD]).collect();
        let outputs = run(&mut flow, &inputs, width);
        for (i, &p) in perm.iter().enumerate() {
            prop_assert_eq!(&outputs[i], &inputs[p]);
        }
    }

    /// A chain declared in shuffled order is scheduled source to sink.
    #[test]
    fn chain_scheduled_in_dependency_order(
        order in (2usize..10).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle()),
    ) {
        let n = order.len();
        let mut graph = new_graph();
        let root = graph.root();
        let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(1)).unwrap();
        let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(1)).unwrap();

        // Stage `k` of the chain is declared at position `order[k]`.
        let mut ids = vec![None; n];
        for declared in 0..n {
            let stage = order.iter().position(|&o| o == declared).unwrap();
            let id = graph
                .add_atomic(root, format!("stage{stage}"), |ports| Gain::new(ports, 1, 0.5))
                .unwrap();
            ids[stage] = Some(id);
        }
        let ids: Vec<_> = ids.into_iter().map(Option::unwrap).collect();

        graph.connect_audio(root, input, .., graph.audio_input(ids[0], "in").unwrap(), ..).unwrap();
        for pair in ids.windows(2) {
            let from = graph.audio_output(pair[0], "out").unwrap();
            let to = graph.audio_input(pair[1], "in").unwrap();
            graph.connect_audio(root, from, .., to, ..).unwrap();
        }
        graph.connect_audio(root, graph.audio_output(ids[n - 1], "out").unwrap(), .., output, ..).unwrap();

        let mut flow = AudioSignalFlow::new(graph).unwrap();
        let schedule: Vec<_> = flow.schedule_ids().collect();
        prop_assert_eq!(&schedule, &ids);

        let outputs = run(&mut flow, &[vec![1.0; PERIOD]], 1);
        let expected = 0.5_f32.powi(n as i32);
        prop_assert!(outputs[0].iter().all(|&s| s == expected));
    }

    /// Messages come out in the order they went in.
    #[test]
    fn queue_preserves_order(values in prop::collection::vec(any::<i32>(), 0..64)) {
        let mut output = MessageQueue::create(ScalarParameter::new(0));
        let mut input = MessageQueue::connect(&mut output).unwrap();
        for &v in &values {
            output.enqueue(ScalarParameter::new(v));
        }
        prop_assert_eq!(input.len(), values.len());
        let mut drained = Vec::with_capacity(values.len());
        while let Ok(message) = input.pop() {
            drained.push(message.value());
        }
        prop_assert_eq!(drained, values);
        prop_assert!(input.is_empty());
    }
}
