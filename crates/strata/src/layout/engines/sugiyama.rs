//! Sugiyama (hierarchical) layout engine
//!
//! Lays out directed graphs in layers: cycles are broken by reversing edges,
//! nodes are assigned to layers by longest path, long edges are split into
//! chains of dummy nodes, layers are reordered to reduce crossings, and
//! finally coordinates are assigned. Dummy chains come back as edge bend
//! points.

mod cycles;
mod dummies;
mod engine;
mod layering;
mod ordering;
mod placement;
mod workspace;

pub use engine::{Engine, LayeringReport};
