//! Criterion benchmarks for the signal-flow engine.
//!
//! Two axes:
//!
//! - **Setup** - integrity check, flattening, scheduling, row resolution and
//!   binding in `AudioSignalFlow::new`
//! - **Execute** - `process()` throughput for gain chains and a mixing matrix
//!
//! Run with: `cargo bench -p spatialflow-core`
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatialflow_core::components::{Gain, GainMatrix};
use spatialflow_core::{AudioPortSpec, AudioSignalFlow, FlowGraph, ParameterRegistry, SignalFlowContext};

const SAMPLE_RATE: u32 = 48_000;
const PERIOD: usize = 64;
const CHANNELS: usize = 2;
const PERIODS: &[usize] = &[64, 128, 256, 512, 1024];

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

/// `stages` gains in series, each wrapped in its own composite.
fn make_nested_chain(stages: usize, period: usize) -> FlowGraph {
    let context = SignalFlowContext::new(period, SAMPLE_RATE).unwrap();
    let mut graph = FlowGraph::new("top", context, Arc::new(ParameterRegistry::new())).unwrap();
    let root = graph.root();
    let input = graph
        .add_audio_port(root, AudioPortSpec::input("in").width(CHANNELS))
        .unwrap();
    let output = graph
        .add_audio_port(root, AudioPortSpec::output("out").width(CHANNELS))
        .unwrap();

    let mut sender = input;
    for stage in 0..stages {
        let sub = graph.add_composite(root, format!("level{stage}")).unwrap();
        let sub_in = graph
            .add_audio_port(sub, AudioPortSpec::input("in").width(CHANNELS))
            .unwrap();
        let gain = graph
            .add_atomic(sub, "gain", |ports| Gain::new(ports, CHANNELS, 0.99))
            .unwrap();
        graph.connect_audio(root, sender, .., sub_in, ..).unwrap();
        graph
            .connect_audio(sub, sub_in, .., graph.audio_input(gain, "in").unwrap(), ..)
            .unwrap();
        let sub_out = graph
            .add_audio_port(sub, AudioPortSpec::output("out").width(CHANNELS))
            .unwrap();
        graph
            .connect_audio(sub, graph.audio_output(gain, "out").unwrap(), .., sub_out, ..)
            .unwrap();
        sender = sub_out;
    }
    graph.connect_audio(root, sender, .., output, ..).unwrap();
    graph
}

fn make_matrix(channels: usize) -> FlowGraph {
    let context = SignalFlowContext::new(PERIOD, SAMPLE_RATE).unwrap();
    let mut graph = FlowGraph::new("top", context, Arc::new(ParameterRegistry::new())).unwrap();
    let root = graph.root();
    let input = graph
        .add_audio_port(root, AudioPortSpec::input("in").width(channels))
        .unwrap();
    let output = graph
        .add_audio_port(root, AudioPortSpec::output("out").width(channels))
        .unwrap();
    let matrix = graph
        .add_atomic(root, "matrix", |ports| GainMatrix::identity(ports, channels))
        .unwrap();
    graph
        .connect_audio(root, input, .., graph.audio_input(matrix, "in").unwrap(), ..)
        .unwrap();
    graph
        .connect_audio(root, graph.audio_output(matrix, "out").unwrap(), .., output, ..)
        .unwrap();
    graph
}

// ---------------------------------------------------------------------------
// Setup benchmarks
// ---------------------------------------------------------------------------

fn bench_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow/setup");
    for stages in [5, 20, 80] {
        group.bench_with_input(BenchmarkId::new("chain", stages), &stages, |b, &stages| {
            b.iter(|| {
                let graph = make_nested_chain(stages, PERIOD);
                black_box(AudioSignalFlow::new(graph).unwrap());
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Execute benchmarks
// ---------------------------------------------------------------------------

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow/execute");

    for &period in PERIODS {
        let mut flow = AudioSignalFlow::new(make_nested_chain(20, period)).unwrap();
        let left = vec![0.5_f32; period];
        let right = vec![0.25_f32; period];
        let mut out_l = vec![0.0_f32; period];
        let mut out_r = vec![0.0_f32; period];
        group.bench_with_input(BenchmarkId::new("chain20", period), &period, |b, _| {
            b.iter(|| {
                flow.process::<f32>(
                    &[black_box(left.as_slice()), black_box(right.as_slice())],
                    &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
                )
                .unwrap();
                black_box((&out_l, &out_r));
            });
        });
    }

    for channels in [2, 8, 32] {
        let mut flow = AudioSignalFlow::new(make_matrix(channels)).unwrap();
        let inputs = vec![vec![0.5_f32; PERIOD]; channels];
        let mut outputs = vec![vec![0.0_f32; PERIOD]; channels];
        group.bench_with_input(BenchmarkId::new("matrix", channels), &channels, |b, _| {
            b.iter(|| {
                let ins: Vec<&[f32]> = inputs.iter().map(Vec::as_slice).collect();
                let mut outs: Vec<&mut [f32]> =
                    outputs.iter_mut().map(Vec::as_mut_slice).collect();
                flow.process::<f32>(black_box(&ins), &mut outs).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_setup, bench_execute);
criterion_main!(benches);
