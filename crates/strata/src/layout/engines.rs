//! Layout engine factory module
//!
//! Engines are selected by [`EngineKind`] and configured from the matching
//! section of the [`LayoutConfig`]. The builder caches one engine per kind so
//! repeated layouts reuse the same instance.

pub mod force;
pub mod sugiyama;

use std::collections::HashMap;

use strata_core::{
    geometry::{Point, Size},
    graph::Graph,
};

use crate::config::{EngineKind, ForceConfig, LayeredConfig, LayoutConfig};

use sugiyama::LayeringReport;

/// Interface shared by the layout engines.
///
/// Engines mutate node positions (and, for the layered engine, edge bend
/// points) of the graph in place.
pub trait Engine {
    /// Prepare the graph for a run, e.g. by seeding initial positions.
    fn init(&mut self, graph: &mut Graph);

    /// Lay out the graph with its top-left corner at `shift`.
    ///
    /// Returns the size of the area covered by the layout.
    fn run(&mut self, graph: &mut Graph, shift: Point) -> Size;

    /// Advance the layout by one incremental step.
    ///
    /// Returns true while the layout is still moving. Engines without an
    /// incremental mode report false.
    fn step(&mut self, graph: &mut Graph) -> bool {
        let _ = graph;
        false
    }

    /// Layer assignment of the last run, for engines that produce one.
    fn layering(&self) -> Option<&LayeringReport> {
        None
    }
}

/// Builder for creating and configuring layout engines.
#[derive(Default)]
pub struct EngineBuilder {
    // Cache for reusing engines with the same configuration
    engines: HashMap<EngineKind, Box<dyn Engine>>,

    force: ForceConfig,
    layered: LayeredConfig,
}

impl EngineBuilder {
    /// Create a new engine builder with default engine configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder configured from a layout section
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new()
            .with_force_config(config.force().clone())
            .with_layered_config(config.layered().clone())
    }

    /// Set the options of the force-directed engine
    pub fn with_force_config(mut self, config: ForceConfig) -> Self {
        self.force = config;
        self
    }

    /// Set the options of the layered engine
    pub fn with_layered_config(mut self, config: LayeredConfig) -> Self {
        self.layered = config;
        self
    }

    /// Get an engine of the specified kind with configured options
    pub fn engine(&mut self, kind: EngineKind) -> &mut dyn Engine {
        let engine = self.engines.entry(kind).or_insert_with(|| {
            let engine: Box<dyn Engine> = match kind {
                EngineKind::Force => Box::new(force::Engine::new(self.force.clone())),
                EngineKind::Layered => Box::new(sugiyama::Engine::new(self.layered.clone())),
            };
            engine
        });
        // Dereference to avoid returning reference to temporary
        &mut **engine
    }
}
