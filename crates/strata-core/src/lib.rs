//! Strata Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Strata layout
//! engines. It includes:
//!
//! - **Identifiers**: Interned, value-typed keys for nodes and edges ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Graph**: The in-memory graph model the engines operate on ([`graph`] module)

pub mod geometry;
pub mod graph;
pub mod identifier;
