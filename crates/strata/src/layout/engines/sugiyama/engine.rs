use std::collections::HashMap;

use log::{debug, info};

use strata_core::{
    geometry::{Point, Size},
    graph::{EdgeIdentity, Graph},
    identifier::Id,
};

use super::{
    cycles::{remove_cycles, restore_cycles},
    dummies::{insert_dummies, remove_dummies},
    layering::assign_layers,
    ordering::reduce_crossings,
    placement::{assign_coordinates, translate_to},
    workspace::Workspace,
};
use crate::{
    config::{EdgeRouting, LayeredConfig, Orientation},
    layout::engines::Engine as LayoutEngine,
};

/// Outcome of the last layered run, kept beside the graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeringReport {
    layers: HashMap<Id, usize>,
    reversed: Vec<EdgeIdentity>,
    crossings: usize,
}

impl LayeringReport {
    /// Layer index of a node, 0 being the first layer.
    pub fn layer(&self, id: Id) -> Option<usize> {
        self.layers.get(&id).copied()
    }

    /// Number of layers used.
    pub fn layer_count(&self) -> usize {
        self.layers.values().max().map_or(0, |&max| max + 1)
    }

    /// Edges that were reversed to break cycles, as identified in the caller's graph.
    pub fn reversed_edges(&self) -> &[EdgeIdentity] {
        &self.reversed
    }

    pub fn is_reversed(&self, identity: &EdgeIdentity) -> bool {
        self.reversed.contains(identity)
    }

    /// Edge crossings left after crossing reduction.
    pub fn crossings(&self) -> usize {
        self.crossings
    }
}

/// The Sugiyama layout engine.
///
/// Writes node positions and edge bend points back into the caller's graph;
/// the caller's edge directions are never changed. Self-loops are ignored and
/// have their bend points cleared.
#[derive(Debug)]
pub struct Engine {
    config: LayeredConfig,
    report: Option<LayeringReport>,
}

impl Engine {
    /// Create a new layered layout engine
    pub fn new(config: LayeredConfig) -> Self {
        Self {
            config,
            report: None,
        }
    }

    pub fn config(&self) -> &LayeredConfig {
        &self.config
    }

    /// Set the gap between siblings within a layer
    pub fn set_node_separation(&mut self, separation: f32) -> &mut Self {
        self.config.node_separation = separation;
        self
    }

    /// Set the gap between consecutive layers
    pub fn set_level_separation(&mut self, separation: f32) -> &mut Self {
        self.config.level_separation = separation;
        self
    }

    /// Set the gap between non-sibling neighbors within a layer
    pub fn set_subtree_separation(&mut self, separation: f32) -> &mut Self {
        self.config.subtree_separation = separation;
        self
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> &mut Self {
        self.config.orientation = orientation;
        self
    }

    /// How renderers should draw edges through their bend points.
    pub fn routing(&self) -> EdgeRouting {
        self.config.routing
    }

    /// Report of the most recent run.
    pub fn report(&self) -> Option<&LayeringReport> {
        self.report.as_ref()
    }

    fn write_back(&self, workspace: &Workspace, graph: &mut Graph) {
        for node in graph.nodes_mut() {
            if let Some(placed) = workspace.graph.node(node.id()) {
                node.set_position(placed.position());
            }
        }

        for edge in graph.edges_mut() {
            edge.set_bend_points(None);
        }
        for edge in workspace.graph.edges() {
            let Some(origin) = edge.key().and_then(|key| workspace.origins.get(&key)) else {
                continue;
            };
            let bends = edge.bend_points().filter(|bends| !bends.is_empty());
            if let Some(target) = graph.edge_mut(origin) {
                target.set_bend_points(bends.map(<[Point]>::to_vec));
            }
        }
        graph.mark_modified();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(LayeredConfig::default())
    }
}

impl LayoutEngine for Engine {
    fn init(&mut self, _graph: &mut Graph) {
        self.report = None;
    }

    fn run(&mut self, graph: &mut Graph, shift: Point) -> Size {
        if graph.is_empty() {
            self.report = Some(LayeringReport::default());
            return Size::default();
        }
        info!(
            nodes_count = graph.node_count(),
            edges_count = graph.edge_count();
            "Running layered layout"
        );

        let mut workspace = Workspace::from_graph(graph);
        remove_cycles(&mut workspace);
        assign_layers(&mut workspace);
        let layers = workspace
            .data
            .iter()
            .map(|(&id, data)| (id, data.layer))
            .collect();
        insert_dummies(&mut workspace);
        let crossings = reduce_crossings(&mut workspace, self.config.crossing_iterations);
        assign_coordinates(&mut workspace, &self.config);
        let size = translate_to(&mut workspace, shift);
        remove_dummies(&mut workspace);

        let reversed = restore_cycles(&mut workspace)
            .iter()
            .filter_map(|key| workspace.origins.get(key).copied())
            .collect();
        self.write_back(&workspace, graph);

        debug!(crossings, width = size.width(), height = size.height(); "Layered layout finished");
        self.report = Some(LayeringReport {
            layers,
            reversed,
            crossings,
        });
        size
    }

    fn layering(&self) -> Option<&LayeringReport> {
        self.report.as_ref()
    }
}
