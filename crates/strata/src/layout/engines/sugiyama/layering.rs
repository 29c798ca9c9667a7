//! Longest-path layer assignment.

use std::collections::HashMap;

use log::debug;

use strata_core::identifier::Id;

use super::workspace::Workspace;

/// Assigns every node of the (acyclic) working graph to a layer.
///
/// Roots go to layer 0; every other node sits one layer below its deepest
/// predecessor, so each edge points from a lower to a higher layer index.
pub(super) fn assign_layers(workspace: &mut Workspace) {
    let graph = &workspace.graph;
    let mut pending: HashMap<Id, usize> = graph
        .node_ids()
        .map(|id| (id, graph.predecessors(id).len()))
        .collect();
    let mut layers: Vec<Vec<Id>> = Vec::new();
    let mut current = graph.roots();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &id in &current {
            for &successor in graph.successors(id) {
                if let Some(count) = pending.get_mut(&successor) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(successor);
                    }
                }
            }
        }
        layers.push(current);
        current = next;
    }

    for (layer, ids) in layers.iter().enumerate() {
        for (position, &id) in ids.iter().enumerate() {
            let data = workspace.data_mut(id);
            data.layer = layer;
            data.position = position;
        }
    }
    debug_assert_eq!(
        layers.iter().map(Vec::len).sum::<usize>(),
        workspace.graph.node_count(),
        "layering requires an acyclic graph"
    );
    debug!(layers_count = layers.len(); "Assigned layers");
    workspace.layers = layers;
}
