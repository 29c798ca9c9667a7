//! Breaking cycles by reversing depth-first back edges.

use std::collections::HashSet;

use log::debug;

use strata_core::{graph::EdgeIdentity, identifier::Id};

use super::workspace::Workspace;

/// Reverses every back edge found by a depth-first search, leaving the
/// working graph acyclic. Returns the number of reversed edges.
///
/// The search starts from every unvisited node in insertion order. The target
/// of each reversed edge records the original source and the edge key in its
/// `reversed` list.
pub(super) fn remove_cycles(workspace: &mut Workspace) -> usize {
    let mut visited: HashSet<Id> = HashSet::with_capacity(workspace.graph.node_count());
    let mut on_path: HashSet<Id> = HashSet::new();
    let mut back_edges: Vec<(Id, Id, Id)> = Vec::new();

    let starts: Vec<Id> = workspace.graph.node_ids().collect();
    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        on_path.insert(start);
        let mut stack = vec![(start, workspace.outgoing(start), 0)];

        while let Some((node, edges, cursor)) = stack.last_mut() {
            let Some(&(key, target)) = edges.get(*cursor) else {
                on_path.remove(node);
                stack.pop();
                continue;
            };
            *cursor += 1;
            let source = *node;

            if on_path.contains(&target) {
                back_edges.push((key, source, target));
            } else if visited.insert(target) {
                on_path.insert(target);
                let edges = workspace.outgoing(target);
                stack.push((target, edges, 0));
            }
        }
    }

    for &(key, source, target) in &back_edges {
        flip(workspace, key);
        workspace.data_mut(target).reversed.push((source, key));
    }
    debug!(reversed_count = back_edges.len(); "Removed cycles");
    back_edges.len()
}

/// Turns the working edge `key` around.
fn flip(workspace: &mut Workspace, key: Id) {
    if let Some(edge) = workspace.take_edge(key) {
        workspace.insert_edge(edge.reversed());
    }
}

/// Points every reversed working edge back in its original direction,
/// following the reversal records of each node, and clears the records.
///
/// Returns the keys of the restored edges in node order.
pub(super) fn restore_cycles(workspace: &mut Workspace) -> Vec<Id> {
    let nodes: Vec<Id> = workspace.graph.node_ids().collect();
    let mut restored = Vec::new();
    for node in nodes {
        let records = std::mem::take(&mut workspace.data_mut(node).reversed);
        for (source, key) in records {
            flip(workspace, key);
            debug_assert!(
                workspace
                    .graph
                    .edge(&EdgeIdentity::Key(key))
                    .is_some_and(|edge| edge.source() == source && edge.target() == node),
                "restored edge must run from its original source"
            );
            restored.push(key);
        }
    }
    restored
}
