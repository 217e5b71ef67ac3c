//! Run a demo graph block by block and check its output.

use std::time::Instant;

use clap::Args;
use spatialflow_config::EngineConfig;

use crate::commands::common::{build_flow, find_demo, ramp};

/// Run a demo graph on ramp input.
#[derive(Args)]
pub struct RunArgs {
    /// Demo graph name (see `spatialflow info`)
    #[arg(value_name = "DEMO")]
    demo: String,

    /// Number of blocks to process
    #[arg(long, short, default_value = "16")]
    blocks: usize,

    /// Largest accepted deviation from the expected output
    #[arg(long, default_value = "1e-6")]
    tolerance: f32,

    /// Print the first samples of every playback channel of the last block
    #[arg(long)]
    show: bool,
}

/// Outcome of a verified run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Blocks processed.
    pub blocks: usize,
    /// Largest absolute deviation seen on any playback sample.
    pub max_deviation: f32,
}

/// Run the run command.
pub fn run(args: RunArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let demo = find_demo(&args.demo)?;
    let mut flow = build_flow(demo, config)?;
    let period = flow.context().period();
    let capture_width = flow.capture_width();
    let playback_width = flow.playback_width();

    println!(
        "Running '{}' for {} blocks of {} samples ({} in, {} out, {} components)",
        demo.name,
        args.blocks,
        period,
        capture_width,
        playback_width,
        flow.schedule().len()
    );

    let mut outputs = vec![vec![0.0_f32; period]; playback_width];
    let mut max_deviation = 0.0_f32;
    let started = Instant::now();

    for block in 0..args.blocks {
        let capture: Vec<Vec<f32>> = (0..capture_width)
            .map(|channel| ramp(block, channel, period))
            .collect();
        {
            let ins: Vec<&[f32]> = capture.iter().map(Vec::as_slice).collect();
            let mut outs: Vec<&mut [f32]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
            flow.process::<f32>(&ins, &mut outs)?;
        }

        let expected = demo.expected(&capture);
        for (actual, wanted) in outputs.iter().zip(&expected) {
            for (a, w) in actual.iter().zip(wanted) {
                max_deviation = max_deviation.max((a - w).abs());
            }
        }

        if max_deviation > args.tolerance {
            anyhow::bail!(
                "block {}: output deviates by {:e} (tolerance {:e})",
                block,
                max_deviation,
                args.tolerance
            );
        }
    }

    let elapsed = started.elapsed();
    let report = RunReport {
        blocks: args.blocks,
        max_deviation,
    };
    tracing::info!(
        blocks = report.blocks,
        max_deviation = report.max_deviation,
        elapsed_us = elapsed.as_micros() as u64,
        "run complete"
    );

    if args.show {
        println!();
        for (channel, samples) in outputs.iter().enumerate() {
            let head: Vec<String> = samples.iter().take(8).map(|s| format!("{s:.4}")).collect();
            println!("  out[{channel}]: {} ...", head.join(" "));
        }
        println!();
    }

    let audio_secs = (report.blocks * period) as f64 / f64::from(flow.context().sample_rate());
    println!(
        "OK: {} blocks ({:.3}s of audio) in {:.3} ms, max deviation {:e}",
        report.blocks,
        audio_secs,
        elapsed.as_secs_f64() * 1000.0,
        report.max_deviation
    );

    let graph = flow.teardown();
    tracing::debug!("torn down `{}`", graph.path(graph.root()));
    Ok(())
}
