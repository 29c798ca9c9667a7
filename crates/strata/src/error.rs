//! Error types for Strata operations.
//!
//! This module provides the main error type [`StrataError`] which wraps
//! the error conditions that can occur while preparing and running a layout.
//! Cycles, disconnected components, and empty graphs are ordinary input and
//! never produce an error.

use thiserror::Error;

use strata_core::graph::GraphError;

/// The main error type for Strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(String),
}
