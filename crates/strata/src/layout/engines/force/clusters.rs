//! Splitting a laid-out graph into connected clusters and packing them side by side.

use std::collections::{HashSet, VecDeque};

use log::debug;

use strata_core::{
    geometry::{Bounds, Point, Size},
    graph::Graph,
    identifier::Id,
};

/// Weakly connected components in discovery order.
///
/// Components are discovered by walking nodes in insertion order; members of
/// each component are listed in breadth-first order.
pub(super) fn find_clusters(graph: &Graph) -> Vec<Vec<Id>> {
    let mut seen: HashSet<Id> = HashSet::with_capacity(graph.node_count());
    let mut clusters = Vec::new();

    for start in graph.node_ids() {
        if !seen.insert(start) {
            continue;
        }
        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            members.push(id);
            for &next in graph.successors(id).iter().chain(graph.predecessors(id)) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        clusters.push(members);
    }

    clusters
}

/// Folds every single-node cluster into the first one.
fn merge_singletons(clusters: Vec<Vec<Id>>) -> Vec<Vec<Id>> {
    let mut merged: Vec<Vec<Id>> = Vec::with_capacity(clusters.len());
    let mut singletons: Option<usize> = None;

    for cluster in clusters {
        match (cluster.len(), singletons) {
            (1, Some(idx)) => merged[idx].extend(cluster),
            (1, None) => {
                singletons = Some(merged.len());
                merged.push(cluster);
            }
            _ => merged.push(cluster),
        }
    }

    merged
}

fn cluster_bounds(graph: &Graph, cluster: &[Id]) -> Option<Bounds> {
    cluster
        .iter()
        .filter_map(|&id| graph.node(id))
        .map(|node| node.bounds())
        .reduce(|acc, bounds| acc.merge(&bounds))
}

fn translate_nodes<'a>(graph: &mut Graph, ids: impl IntoIterator<Item = &'a Id>, offset: Point) {
    for id in ids {
        if let Some(node) = graph.node_mut(*id) {
            node.set_position(node.position().add_point(offset));
        }
    }
}

/// Moves the layout to the origin and lays its clusters out left to right.
///
/// Each cluster keeps its internal arrangement; clusters are top-aligned and
/// separated horizontally by `padding`. Returns the size of the packed layout.
pub(super) fn pack_clusters(graph: &mut Graph, padding: f32) -> Size {
    let Some(bounds) = graph.bounds() else {
        return Size::default();
    };
    let to_origin = bounds.min_point().scale(-1.0);
    for node in graph.nodes_mut() {
        node.set_position(node.position().add_point(to_origin));
    }

    let clusters = merge_singletons(find_clusters(graph));
    debug!(clusters_count = clusters.len(); "Packing clusters");

    let mut cursor = 0.0;
    for cluster in &clusters {
        let Some(bounds) = cluster_bounds(graph, cluster) else {
            continue;
        };
        let offset = Point::new(cursor - bounds.min_x(), -bounds.min_y());
        translate_nodes(graph, cluster, offset);
        cursor += bounds.width() + padding;
    }

    graph
        .bounds()
        .map(|bounds| bounds.to_size())
        .unwrap_or_default()
}
