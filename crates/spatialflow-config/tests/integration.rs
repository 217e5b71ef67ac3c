//! Integration tests for spatialflow-config.
//!
//! These tests verify file round trips and that a loaded configuration
//! drives a real signal flow.

use std::sync::Arc;

use spatialflow_config::{ConfigError, EngineConfig, ValidationError};
use spatialflow_core::components::Gain;
use spatialflow_core::{AudioPortSpec, AudioSignalFlow, FlowGraph, ParameterRegistry};
use tempfile::TempDir;

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");

    let mut config = EngineConfig::default();
    config.context.period = 480;
    config.context.sample_rate = 96000;
    config.memory.alignment_bytes = 64;
    config.logging.level = "debug".to_string();
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("engine.toml");

    EngineConfig::default().save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    match EngineConfig::load(&path) {
        Err(ConfigError::ReadFile { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

#[test]
fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[context\nperiod = 64").unwrap();

    assert!(matches!(
        EngineConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn test_loaded_file_validates_all_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[context]
period = 0
sample_rate = 0

[logging]
level = "chatty"
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let Err(ValidationError::Multiple(errors)) = config.validate() else {
        panic!("expected several validation errors");
    };
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_config_drives_flow() {
    let config = EngineConfig::from_toml(
        r#"
[context]
period = 32
sample_rate = 44100

[memory]
alignment_bytes = 64
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let mut graph = FlowGraph::new(
        "top",
        config.context().unwrap(),
        Arc::new(ParameterRegistry::new()),
    )
    .unwrap();
    let root = graph.root();
    let input = graph
        .add_audio_port(root, AudioPortSpec::input("in").width(1))
        .unwrap();
    let output = graph
        .add_audio_port(root, AudioPortSpec::output("out").width(1))
        .unwrap();
    let gain = graph
        .add_atomic(root, "gain", |ports| Gain::new(ports, 1, 0.5))
        .unwrap();
    graph
        .connect_audio(root, input, .., graph.audio_input(gain, "in").unwrap(), ..)
        .unwrap();
    graph
        .connect_audio(root, graph.audio_output(gain, "out").unwrap(), .., output, ..)
        .unwrap();

    let mut flow = AudioSignalFlow::with_options(graph, config.flow_options().unwrap()).unwrap();
    assert_eq!(flow.options().alignment_bytes, 64);
    assert_eq!(flow.context().period(), 32);

    let input = vec![1.0_f32; 32];
    let mut output = vec![0.0_f32; 32];
    flow.process::<f32>(&[&input], &mut [&mut output]).unwrap();
    assert!(output.iter().all(|&s| s == 0.5));
}
