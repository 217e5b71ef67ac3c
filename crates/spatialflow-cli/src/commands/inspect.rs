//! Structure dump of a demo graph after engine setup.

use clap::Args;
use serde::Serialize;
use spatialflow_config::EngineConfig;
use spatialflow_core::{AudioSignalFlow, ComponentId, FlowGraph, SampleType};

use crate::commands::common::{build_flow, find_demo, short_type_name};

/// Show tree, schedule, links and row map of a demo graph.
#[derive(Args)]
pub struct InspectArgs {
    /// Demo graph name (see `spatialflow info`)
    #[arg(value_name = "DEMO")]
    demo: String,

    /// Print as JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Machine-readable summary of a configured flow.
#[derive(Debug, Serialize)]
struct FlowSummary {
    demo: String,
    period: usize,
    sample_rate: u32,
    alignment_bytes: usize,
    state: String,
    schedule: Vec<String>,
    capture_width: usize,
    playback_width: usize,
    f32_signals: usize,
    f64_signals: usize,
    audio_links: Vec<AudioLink>,
    parameter_links: Vec<ParameterLink>,
    rows: Vec<RowEntry>,
}

#[derive(Debug, Serialize)]
struct AudioLink {
    sender: String,
    receiver: String,
}

#[derive(Debug, Serialize)]
struct ParameterLink {
    sender: String,
    receivers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RowEntry {
    port: String,
    channel: usize,
    row: usize,
}

/// Run the inspect command.
pub fn run(args: InspectArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let demo = find_demo(&args.demo)?;
    let flow = build_flow(demo, config)?;
    let summary = summarize(demo.name, &flow);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Demo:      {}", summary.demo);
    println!(
        "Context:   {} samples @ {} Hz, rows aligned to {} bytes",
        summary.period, summary.sample_rate, summary.alignment_bytes
    );
    println!("State:     {}", summary.state);
    println!(
        "External:  {} capture / {} playback channels",
        summary.capture_width, summary.playback_width
    );
    println!(
        "Signals:   {} f32 rows, {} f64 rows",
        summary.f32_signals, summary.f64_signals
    );

    println!();
    println!("Component Tree");
    println!("--------------");
    print_tree(flow.graph(), flow.graph().root(), 0);

    println!();
    println!("Schedule");
    println!("--------");
    for (step, path) in summary.schedule.iter().enumerate() {
        println!("  {step:>3}. {path}");
    }

    println!();
    println!("Audio Links");
    println!("-----------");
    for link in &summary.audio_links {
        println!("  {} -> {}", link.sender, link.receiver);
    }

    if !summary.parameter_links.is_empty() {
        println!();
        println!("Parameter Links");
        println!("---------------");
        for link in &summary.parameter_links {
            println!("  {} -> {}", link.sender, link.receivers.join(", "));
        }
    }

    println!();
    println!("Row Map");
    println!("-------");
    for entry in &summary.rows {
        println!("  {:>4}  {}[{}]", entry.row, entry.port, entry.channel);
    }

    Ok(())
}

fn summarize(demo: &str, flow: &AudioSignalFlow) -> FlowSummary {
    let context = flow.context();
    FlowSummary {
        demo: demo.to_string(),
        period: context.period(),
        sample_rate: context.sample_rate(),
        alignment_bytes: flow.options().alignment_bytes,
        state: flow.state().to_string(),
        schedule: flow.schedule(),
        capture_width: flow.capture_width(),
        playback_width: flow.playback_width(),
        f32_signals: flow.signal_count(SampleType::F32),
        f64_signals: flow.signal_count(SampleType::F64),
        audio_links: flow
            .audio_connections()
            .into_iter()
            .map(|(sender, receiver)| AudioLink { sender, receiver })
            .collect(),
        parameter_links: flow
            .parameter_connections()
            .into_iter()
            .map(|(sender, receivers)| ParameterLink { sender, receivers })
            .collect(),
        rows: row_map(flow),
    }
}

/// Rows of the top-level ports followed by every scheduled component's ports.
fn row_map(flow: &AudioSignalFlow) -> Vec<RowEntry> {
    let graph = flow.graph();
    let components = std::iter::once(graph.root()).chain(flow.schedule_ids());

    let mut rows = Vec::new();
    for component in components {
        for port in graph.audio_ports(component) {
            let Ok(id) = graph.find_audio_port(component, port.direction(), port.name()) else {
                continue;
            };
            let label = graph.audio_label(id);
            for channel in 0..port.width().unwrap_or(0) {
                if let Some(row) = flow.row_of(id, channel) {
                    rows.push(RowEntry {
                        port: label.clone(),
                        channel,
                        row,
                    });
                }
            }
        }
    }
    rows
}

fn print_tree(graph: &FlowGraph, id: ComponentId, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    match graph.type_name(id) {
        Some(type_name) => println!(
            "{indent}{} ({})",
            graph.name(id),
            short_type_name(type_name)
        ),
        None => println!("{indent}{}/", graph.name(id)),
    }
    for port in graph.audio_ports(id) {
        let width = port
            .width()
            .map_or_else(|| "?".to_string(), |w| w.to_string());
        println!(
            "{indent}  - {} {} {} x{}",
            port.direction(),
            port.name(),
            port.sample_type(),
            width
        );
    }
    for port in graph.parameter_ports(id) {
        println!(
            "{indent}  - {} {} {}/{} {}",
            port.direction(),
            port.name(),
            port.kind(),
            port.protocol(),
            port.config()
        );
    }
    for &child in graph.children(id) {
        print_tree(graph, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos;

    #[test]
    fn test_row_map_covers_boundary_and_components() {
        let config = EngineConfig::default();
        let demo = demos::find("identity").unwrap();
        let flow = build_flow(demo, &config).unwrap();
        let summary = summarize(demo.name, &flow);

        assert_eq!(summary.schedule, vec!["top/identity/matrix".to_string()]);
        // 2 top-level inputs, 2 top-level outputs, matrix in and out.
        assert_eq!(summary.rows.len(), 8);
        let capture_left = summary
            .rows
            .iter()
            .find(|r| r.port == "top.in" && r.channel == 0)
            .unwrap()
            .row;
        let matrix_left = summary
            .rows
            .iter()
            .find(|r| r.port == "top/identity/matrix.in" && r.channel == 0)
            .unwrap()
            .row;
        assert_eq!(capture_left, matrix_left);
    }

    #[test]
    fn test_summary_serializes() {
        let config = EngineConfig::default();
        let flow = build_flow(demos::find("fanout").unwrap(), &config).unwrap();
        let json = serde_json::to_value(summarize("fanout", &flow)).unwrap();
        assert_eq!(json["playback_width"], 3);
        assert_eq!(json["schedule"].as_array().unwrap().len(), 3);
        assert_eq!(json["state"], "ready");
    }
}
