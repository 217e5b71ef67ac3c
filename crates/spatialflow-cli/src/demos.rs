//! Built-in demo graphs.
//!
//! Each demo builds a complete [`FlowGraph`] from the utility components in
//! `spatialflow-core` and knows what its playback channels must contain for
//! a given block of capture channels, so `spatialflow run` can check the
//! engine end to end.

use std::sync::Arc;

use spatialflow_core::components::{Add, Gain, GainMatrix};
use spatialflow_core::{
    AudioPortSpec, ConfigurationError, FlowGraph, MatrixParameter, ParameterRegistry,
    SignalFlowContext,
};

type BuildFn = fn(SignalFlowContext) -> Result<FlowGraph, ConfigurationError>;
type ExpectFn = fn(&[Vec<f32>]) -> Vec<Vec<f32>>;

/// A named demo graph.
#[derive(Debug)]
pub struct Demo {
    /// Name used on the command line.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    build: BuildFn,
    expect: ExpectFn,
}

impl Demo {
    /// Builds a fresh component tree.
    pub fn build(&self, context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
        (self.build)(context)
    }

    /// Playback channels the graph must produce for `capture`.
    pub fn expected(&self, capture: &[Vec<f32>]) -> Vec<Vec<f32>> {
        (self.expect)(capture)
    }
}

/// All demos, in listing order.
pub const DEMOS: &[Demo] = &[
    Demo {
        name: "passthrough",
        description: "Stereo capture wired straight to playback",
        build: passthrough,
        expect: |capture| capture.to_vec(),
    },
    Demo {
        name: "identity",
        description: "2x2 identity gain matrix inside a nested composite",
        build: nested_identity,
        expect: |capture| capture.to_vec(),
    },
    Demo {
        name: "swap",
        description: "Gain matrix exchanging left and right",
        build: swap,
        expect: |capture| capture.iter().rev().cloned().collect(),
    },
    Demo {
        name: "fanout",
        description: "Mono source feeding three gains (x1, x2, x3)",
        build: fanout,
        expect: |capture| {
            (1..=3)
                .map(|k| capture[0].iter().map(|s| s * k as f32).collect())
                .collect()
        },
    },
    Demo {
        name: "downmix",
        description: "Stereo halved and summed to mono",
        build: downmix,
        expect: |capture| {
            vec![
                capture[0]
                    .iter()
                    .zip(&capture[1])
                    .map(|(l, r)| 0.5 * l + 0.5 * r)
                    .collect(),
            ]
        },
    },
];

/// Looks up a demo by name, ignoring case.
pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

fn new_graph(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    FlowGraph::new("top", context, Arc::new(ParameterRegistry::new()))
}

fn passthrough(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    let mut graph = new_graph(context)?;
    let root = graph.root();
    let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(2))?;
    let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(2))?;
    graph.connect_audio(root, input, .., output, ..)?;
    Ok(graph)
}

fn nested_identity(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    let mut graph = new_graph(context)?;
    let root = graph.root();
    let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(2))?;
    let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(2))?;

    let identity = graph.add_composite(root, "identity")?;
    let sub_in = graph.add_audio_port(identity, AudioPortSpec::input("in").width(2))?;
    let sub_out = graph.add_audio_port(identity, AudioPortSpec::output("out").width(2))?;
    let matrix = graph.add_atomic(identity, "matrix", |ports| GainMatrix::identity(ports, 2))?;

    let matrix_in = graph.audio_input(matrix, "in")?;
    let matrix_out = graph.audio_output(matrix, "out")?;
    graph.connect_audio(identity, sub_in, .., matrix_in, ..)?;
    graph.connect_audio(identity, matrix_out, .., sub_out, ..)?;
    graph.connect_audio(root, input, .., sub_in, ..)?;
    graph.connect_audio(root, sub_out, .., output, ..)?;
    Ok(graph)
}

fn swap(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    let mut graph = new_graph(context)?;
    let root = graph.root();
    let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(2))?;
    let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(2))?;

    let mut gains = MatrixParameter::new(2, 2);
    gains.set(0, 1, 1.0);
    gains.set(1, 0, 1.0);
    let matrix = graph.add_atomic(root, "matrix", |ports| GainMatrix::new(ports, &gains))?;

    let matrix_in = graph.audio_input(matrix, "in")?;
    let matrix_out = graph.audio_output(matrix, "out")?;
    graph.connect_audio(root, input, .., matrix_in, ..)?;
    graph.connect_audio(root, matrix_out, .., output, ..)?;
    Ok(graph)
}

fn fanout(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    let mut graph = new_graph(context)?;
    let root = graph.root();
    let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(1))?;
    let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(3))?;

    for (channel, factor) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        let gain = graph.add_atomic(root, format!("gain{channel}"), move |ports| {
            Gain::new(ports, 1, factor)
        })?;
        let gain_in = graph.audio_input(gain, "in")?;
        let gain_out = graph.audio_output(gain, "out")?;
        graph.connect_audio(root, input, 0, gain_in, 0)?;
        graph.connect_audio(root, gain_out, 0, output, channel)?;
    }
    Ok(graph)
}

fn downmix(context: SignalFlowContext) -> Result<FlowGraph, ConfigurationError> {
    let mut graph = new_graph(context)?;
    let root = graph.root();
    let input = graph.add_audio_port(root, AudioPortSpec::input("in").width(2))?;
    let output = graph.add_audio_port(root, AudioPortSpec::output("out").width(1))?;

    let half = graph.add_atomic(root, "half", |ports| Gain::new(ports, 2, 0.5))?;
    let sum = graph.add_atomic(root, "sum", |ports| Add::<f32>::new(ports, 2, 1))?;

    let half_in = graph.audio_input(half, "in")?;
    let half_out = graph.audio_output(half, "out")?;
    let sum_left = graph.audio_input(sum, "in0")?;
    let sum_right = graph.audio_input(sum, "in1")?;
    let sum_out = graph.audio_output(sum, "out")?;

    graph.connect_audio(root, input, .., half_in, ..)?;
    graph.connect_audio(root, half_out, 0, sum_left, 0)?;
    graph.connect_audio(root, half_out, 1, sum_right, 0)?;
    graph.connect_audio(root, sum_out, .., output, ..)?;
    Ok(graph)
}
