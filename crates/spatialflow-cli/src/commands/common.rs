//! Shared CLI helpers used across multiple commands.

use spatialflow_config::EngineConfig;
use spatialflow_core::AudioSignalFlow;

use crate::demos::{self, DEMOS, Demo};

/// Looks up a demo, listing the valid names on failure.
pub fn find_demo(name: &str) -> anyhow::Result<&'static Demo> {
    demos::find(name).ok_or_else(|| {
        let names: Vec<&str> = DEMOS.iter().map(|d| d.name).collect();
        anyhow::anyhow!(
            "Unknown demo '{}'. Available demos: {}",
            name,
            names.join(", ")
        )
    })
}

/// Builds `demo` under `config` and sets up the engine.
pub fn build_flow(demo: &Demo, config: &EngineConfig) -> anyhow::Result<AudioSignalFlow> {
    let graph = demo.build(config.context()?)?;
    Ok(AudioSignalFlow::with_options(graph, config.flow_options()?)?)
}

/// Strips module paths from a Rust type name, keeping generic arguments.
///
/// `spatialflow_core::components::add::Add<f32>` becomes `Add<f32>`.
pub fn short_type_name(type_name: &str) -> &str {
    let base_end = type_name.find('<').unwrap_or(type_name.len());
    let start = type_name[..base_end].rfind("::").map_or(0, |i| i + 2);
    &type_name[start..]
}

/// Ramp continuing across blocks, offset per channel.
pub fn ramp(block: usize, channel: usize, period: usize) -> Vec<f32> {
    (0..period)
        .map(|n| ((block * period + n) % 1000) as f32 * 0.001 + channel as f32 * 0.1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(
            short_type_name("spatialflow_core::components::gain::Gain"),
            "Gain"
        );
        assert_eq!(
            short_type_name("spatialflow_core::components::add::Add<f32>"),
            "Add<f32>"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_ramp_continues_across_blocks() {
        let second = ramp(1, 0, 4);
        assert_eq!(second[0], 4.0 * 0.001);
        assert_eq!(ramp(0, 2, 4)[0], 2.0 * 0.1);
    }

    #[test]
    fn test_unknown_demo_lists_names() {
        let err = find_demo("nope").unwrap_err().to_string();
        assert!(err.contains("passthrough"), "got: {err}");
    }
}
