//! Errors of the command-line front end, rendered with `miette`.

use std::io;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use strata::StrataError;

use crate::config::ConfigError;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(strata::io))]
    Io(#[from] io::Error),

    #[error(transparent)]
    #[diagnostic(code(strata::config))]
    Config(#[from] ConfigError),

    #[error("Invalid graph file: {message}")]
    #[diagnostic(
        code(strata::input),
        help("nodes need an `id`, edges need a `source` and a `target`")
    )]
    Input {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("Unknown layout engine `{0}`")]
    #[diagnostic(code(strata::engine), help("use `force` or `layered`"))]
    Engine(String),

    #[error(transparent)]
    #[diagnostic(code(strata::layout))]
    Layout(#[from] StrataError),
}
