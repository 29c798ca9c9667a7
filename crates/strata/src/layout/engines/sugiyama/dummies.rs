//! Splitting long edges into dummy chains and joining them back.

use std::collections::HashSet;

use log::debug;

use strata_core::{geometry::Point, graph::Edge, identifier::Id};

use super::workspace::Workspace;

/// Replaces every edge spanning more than one layer by a chain of dummies,
/// one per intermediate layer. Returns the number of dummies inserted.
pub(super) fn insert_dummies(workspace: &mut Workspace) -> usize {
    let long_keys: Vec<Id> = workspace
        .graph
        .edges()
        .filter_map(|edge| {
            let from = workspace.data(edge.source()).layer;
            let to = workspace.data(edge.target()).layer;
            if to > from + 1 { edge.key() } else { None }
        })
        .collect();
    let long_edges = workspace.take_edges(long_keys);

    let mut inserted = 0;
    for edge in long_edges {
        let Some(key) = edge.key() else {
            continue;
        };
        let from = workspace.data(edge.source()).layer;
        let to = workspace.data(edge.target()).layer;

        let mut previous = edge.source();
        for layer in (from + 1)..to {
            let dummy = workspace.add_dummy(key, layer);
            workspace.connect(previous, dummy);
            previous = dummy;
            inserted += 1;
        }
        workspace.connect(previous, edge.target());
    }

    workspace.index_layers();
    debug!(dummies_count = inserted; "Inserted dummy nodes");
    inserted
}

/// Removes every dummy, reconnecting each chain under its original edge key.
///
/// Each chain is walked from the real node above its first dummy; the
/// dummies' positions become the joined edge's bend points, top to bottom.
pub(super) fn remove_dummies(workspace: &mut Workspace) {
    let heads: Vec<Id> = workspace
        .layers
        .iter()
        .flatten()
        .copied()
        .filter(|&id| workspace.data(id).is_dummy())
        .filter(|&id| {
            workspace
                .sole_incoming(id)
                .is_some_and(|edge| !workspace.data(edge.source()).is_dummy())
        })
        .collect();

    let mut doomed: HashSet<Id> = HashSet::new();
    let mut joined: Vec<Edge> = Vec::with_capacity(heads.len());
    for head in heads {
        let (Some(chain), Some(first)) = (workspace.data(head).chain, workspace.sole_incoming(head))
        else {
            continue;
        };
        let source = first.source();
        let mut bends: Vec<Point> = first.bend_points().unwrap_or_default().to_vec();

        let mut current = head;
        while workspace.data(current).is_dummy() {
            let Some(next) = workspace.sole_outgoing(current) else {
                panic!("Dummy node {current} must have exactly one edge in and out");
            };
            let position = workspace
                .graph
                .node(current)
                .map(|node| node.position())
                .unwrap_or_default();
            bends.push(position);
            bends.extend_from_slice(next.bend_points().unwrap_or_default());
            doomed.insert(current);
            current = next.target();
        }

        let mut edge = Edge::new(source, current).with_key(chain);
        edge.set_bend_points(Some(bends));
        joined.push(edge);
    }

    workspace.remove_nodes(&doomed);
    for edge in joined {
        workspace.insert_edge(edge);
    }
    for layer in &mut workspace.layers {
        layer.retain(|id| !doomed.contains(id));
    }
    debug!(dummies_count = doomed.len(); "Removed dummy nodes");
}
