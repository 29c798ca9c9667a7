//! Strata - Automatic layout of directed graphs.
//!
//! Two engines position the nodes of a [`graph::Graph`]:
//!
//! - a force-directed engine (Fruchterman–Reingold, optionally accelerated
//!   with a Barnes–Hut quadtree) for general graphs, and
//! - a layered engine (Sugiyama) for directed, mostly hierarchical graphs,
//!   which also routes edges through bend points.
//!
//! Engines write their results straight into the graph: node positions are
//! centers, and the returned [`geometry::Size`] is the extent of the layout.

pub mod config;

mod error;
mod layout;

pub use strata_core::{geometry, graph, identifier};

pub use error::StrataError;
pub use layout::{Engine, EngineBuilder, ForceEngine, LayeredEngine, LayeringReport};

use log::{debug, info};

use config::{AppConfig, EngineKind};
use geometry::{Point, Size};
use graph::Graph;

/// Result of [`LayoutBuilder::layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    engine: EngineKind,
    size: Size,
    layering: Option<LayeringReport>,
}

impl Layout {
    /// Engine that produced the layout.
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Extent of the area covered by the nodes.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Layer assignment and reversed edges, for layered layouts.
    pub fn layering(&self) -> Option<&LayeringReport> {
        self.layering.as_ref()
    }
}

/// Builder for laying out graphs with a configured engine.
///
/// # Examples
///
/// ```rust
/// use strata::{LayoutBuilder, config::{AppConfig, EngineKind}, graph::Graph, identifier::Id};
///
/// let mut graph = Graph::new();
/// graph.connect(Id::new("a"), Id::new("b"));
/// graph.connect(Id::new("b"), Id::new("c"));
///
/// let mut config = AppConfig::default();
/// config.layout_mut().set_engine(EngineKind::Layered);
///
/// let layout = LayoutBuilder::new(config)
///     .layout(&mut graph)
///     .expect("Failed to lay out graph");
/// assert_eq!(layout.layering().unwrap().layer(Id::new("c")), Some(2));
/// ```
#[derive(Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lay out the graph with its top-left corner at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] for invalid engine options and
    /// [`StrataError::Layout`] if the engine produced non-finite coordinates.
    pub fn layout(&self, graph: &mut Graph) -> Result<Layout, StrataError> {
        self.layout_at(graph, Point::default())
    }

    /// Lay out the graph with its top-left corner at `shift`.
    ///
    /// # Errors
    ///
    /// See [`LayoutBuilder::layout`].
    pub fn layout_at(&self, graph: &mut Graph, shift: Point) -> Result<Layout, StrataError> {
        self.config.validate()?;
        let kind = self.config.layout().engine();
        info!(
            engine:? = kind,
            nodes_count = graph.node_count(),
            edges_count = graph.edge_count();
            "Laying out graph"
        );

        let mut engines = EngineBuilder::from_config(self.config.layout());
        let engine = engines.engine(kind);
        engine.init(graph);
        let size = engine.run(graph, shift);
        let layering = engine.layering().cloned();

        if let Some(node) = graph.nodes().find(|node| !node.position().is_finite()) {
            return Err(StrataError::Layout(format!(
                "node `{}` ended up at a non-finite position",
                node.id()
            )));
        }
        debug!(width = size.width(), height = size.height(); "Layout calculated");

        Ok(Layout {
            engine: kind,
            size,
            layering,
        })
    }
}
