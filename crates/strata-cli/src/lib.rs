//! CLI logic for the Strata graph layout tool.
//!
//! This module contains the core CLI logic: load configuration, read a graph
//! file, lay it out, and write a plain-text report.

mod args;
mod config;
mod error;
mod input;
mod report;

pub use args::Args;
pub use config::ConfigError;
pub use error::CliError;

use std::{fs, str::FromStr};

use log::info;

use strata::{LayoutBuilder, config::EngineKind};

/// Run the Strata CLI application
///
/// This function lays out the input graph and writes the report to the
/// output file, or to stdout when no output path is given.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed graph files
/// - Unknown engine names
/// - Layout errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing graph"
    );

    // Load configuration
    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(name) = &args.engine {
        let engine = EngineKind::from_str(name).map_err(|_| CliError::Engine(name.clone()))?;
        app_config.layout_mut().set_engine(engine);
    }

    // Read input file
    let source = fs::read_to_string(&args.input)?;
    let mut graph = input::parse_graph(&source, &args.input)?;

    let layout = LayoutBuilder::new(app_config).layout(&mut graph)?;
    let text = report::render(&graph, &layout);

    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path; "Layout report written");
        }
        None => print!("{text}"),
    }

    Ok(())
}
