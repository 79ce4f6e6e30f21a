// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Run a logic scene bundle headless and print what it did to the scene
#[derive(Debug, Clone, Parser)]
#[command(name = "ordoplay_logic_viewer", version, about, long_about = None)]
pub struct Args {
    /// Scene bundle (RON) with a host scene and a logic graph
    #[arg(value_name = "PATH")]
    pub bundle: PathBuf,

    /// Number of update passes to run
    #[arg(long, default_value_t = 60)]
    pub frames: u32,

    /// Pause between passes in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 16)]
    pub interval_ms: u64,

    /// Write the built-in demo bundle to PATH before running it
    #[arg(long)]
    pub write_demo: bool,

    /// Save the graph and scene after the last pass
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Logging level; `RUST_LOG` is used when omitted
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
