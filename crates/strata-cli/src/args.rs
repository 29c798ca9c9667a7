//! Command-line arguments.

use clap::Parser;

/// Lays out a graph described in TOML and prints node positions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Graph file to lay out
    pub input: String,

    /// Path to the layout report; printed to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Configuration file; searched for when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Layout engine overriding the configuration (force, layered)
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
