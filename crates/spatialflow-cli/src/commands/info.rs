//! Registry, protocol and demo listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use spatialflow_config::EngineConfig;
use spatialflow_core::{ParameterRegistry, ProtocolKind};

use crate::commands::common::short_type_name;
use crate::demos::DEMOS;

/// List what the engine offers.
#[derive(Args)]
pub struct InfoArgs {
    /// Also print the engine configuration in effect
    #[arg(long)]
    show_config: bool,
}

/// Run the info command.
pub fn run(args: InfoArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let registry = ParameterRegistry::new();

    println!("Parameter Kinds");
    println!("===============");
    println!();
    println!("  {:20}  {:28}  {}", "Kind", "Type", "Description");
    println!("  {:20}  {:28}  {}", "----", "----", "-----------");
    for info in registry.all_kinds() {
        println!(
            "  {:20}  {:28}  {}",
            info.kind.to_string(),
            short_type_name(info.type_name),
            info.description
        );
    }

    println!();
    println!("Protocols");
    println!("=========");
    println!();
    for kind in ProtocolKind::ALL {
        let fan_out = if kind.supports_fan_out() {
            "fan-out"
        } else {
            "single consumer"
        };
        println!("  {:16} - {}", kind.name(), fan_out);
    }

    println!();
    println!("Demo Graphs");
    println!("===========");
    println!();
    for demo in DEMOS {
        println!("  {:12} - {}", demo.name, demo.description);
    }
    println!();
    println!("Use 'spatialflow inspect <demo>' or 'spatialflow run <demo>'.");

    if args.show_config {
        println!();
        println!("Engine Configuration");
        println!("====================");
        println!();
        print!("{}", config.to_toml()?);
    }

    Ok(())
}
