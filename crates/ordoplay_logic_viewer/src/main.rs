// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless runner for `OrdoPlay` logic scenes.
//!
//! Loads a scene bundle, runs a number of update passes against its host
//! scene and prints the resulting scene fields and the last update report.

mod bundle;
mod cli;
mod demo;
mod scripts;

use bundle::{BundleError, SceneBundle};
use clap::Parser;
use cli::{Args, LogLevel};
use ordoplay_logic::{HostScene, LogicEngine};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_logging(level: Option<LogLevel>) {
    let env_filter = match level {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ordoplay_logic=info,ordoplay_logic_viewer=info")),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_level);
    tracing::info!("Starting OrdoPlay logic viewer v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        tracing::error!("Viewer failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), BundleError> {
    if args.write_demo {
        demo::bundle()?.save(&args.bundle)?;
        tracing::info!("Wrote demo bundle to {}", args.bundle.display());
    }

    let bundle = SceneBundle::load(&args.bundle)?;
    let mut engine = bundle.instantiate(scripts::builtin())?;
    engine.enable_update_report(true);
    for warning in engine.validate() {
        println!("warning: {warning}");
    }

    let interval = Duration::from_millis(args.interval_ms);
    for frame in 0..args.frames {
        engine.update()?;
        tracing::debug!(frame, "Update pass finished");
        if !interval.is_zero() && frame + 1 < args.frames {
            std::thread::sleep(interval);
        }
    }

    print_report(&engine);
    print_scene(&engine);

    if let Some(path) = &args.save {
        SceneBundle::capture(&engine).save(path)?;
        tracing::info!("Saved bundle to {}", path.display());
    }
    Ok(())
}

fn print_report(engine: &LogicEngine) {
    let Some(report) = engine.last_update_report() else {
        return;
    };
    let names = |ids: &[ordoplay_logic::NodeId]| {
        ids.iter()
            .filter_map(|id| engine.node(*id).map(|n| n.name().to_owned()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("last pass: {:?}", report.total_time);
    println!("  executed: [{}]", names(&report.executed));
    println!("  skipped:  [{}]", names(&report.skipped));
    println!("  links activated: {}", report.links_activated);
}

fn print_scene(engine: &LogicEngine) {
    let host = engine.host();
    for (id, object) in host.objects() {
        println!("{} ({:?}, {:?})", object.name, object.kind, id);
        for (field, value) in &object.fields {
            println!("  {field} = {value:?}");
        }
        if let Some(world) = host.world_translation(id) {
            println!("  world translation = {world:?}");
        }
    }
    for node in engine.nodes() {
        let Some(outputs) = node.outputs() else {
            continue;
        };
        let tree = node.properties();
        for slot in tree.leaves(outputs) {
            if let Some(value) = tree.get(slot).and_then(|p| p.value()) {
                println!("{}.{} = {value:?}", node.name(), tree.path_of(slot));
            }
        }
    }
}
