//! Crossing reduction by weighted-median sweeps and adjacent transpositions.

use log::{debug, trace};

use strata_core::identifier::Id;

use super::workspace::Workspace;

/// Reorders the nodes within each layer to reduce edge crossings.
///
/// Sweeps alternate between top-down (ordering by predecessors) and
/// bottom-up (ordering by successors), each followed by a transposition pass.
/// The best ordering seen is kept. Stops after `iterations` sweeps or as soon
/// as no crossings remain.
pub(super) fn reduce_crossings(workspace: &mut Workspace, iterations: usize) -> usize {
    workspace.index_layers();
    let mut best = workspace.layers.clone();
    let mut best_crossings = total_crossings(workspace);

    for iteration in 0..iterations {
        if best_crossings == 0 {
            break;
        }
        median_sweep(workspace, iteration % 2 == 0);
        transpose(workspace);

        let crossings = total_crossings(workspace);
        trace!(iteration, crossings; "Crossing reduction sweep");
        if crossings < best_crossings {
            best = workspace.layers.clone();
            best_crossings = crossings;
        }
    }

    workspace.layers = best;
    workspace.index_layers();
    debug!(crossings = best_crossings; "Reduced crossings");
    best_crossings
}

fn neighbors(workspace: &Workspace, id: Id, upward: bool) -> &[Id] {
    if upward {
        workspace.graph.predecessors(id)
    } else {
        workspace.graph.successors(id)
    }
}

fn neighbor_positions(workspace: &Workspace, id: Id, upward: bool) -> Vec<usize> {
    let mut positions: Vec<usize> = neighbors(workspace, id, upward)
        .iter()
        .map(|&neighbor| workspace.data(neighbor).position)
        .collect();
    positions.sort_unstable();
    positions
}

/// Median of sorted positions, interpolated towards the denser side when the
/// count is even.
pub(super) fn weighted_median(positions: &[usize]) -> Option<f32> {
    let len = positions.len();
    let at = |idx: usize| positions[idx] as f32;
    let mid = len / 2;
    match len {
        0 => None,
        _ if len % 2 == 1 => Some(at(mid)),
        2 => Some((at(0) + at(1)) / 2.0),
        _ => {
            let left = at(mid - 1) - at(0);
            let right = at(len - 1) - at(mid);
            if left + right == 0.0 {
                Some((at(mid - 1) + at(mid)) / 2.0)
            } else {
                Some((at(mid - 1) * right + at(mid) * left) / (left + right))
            }
        }
    }
}

fn median_sweep(workspace: &mut Workspace, top_down: bool) {
    let layer_count = workspace.layers.len();
    let order: Vec<usize> = if top_down {
        (1..layer_count).collect()
    } else {
        (0..layer_count.saturating_sub(1)).rev().collect()
    };

    for layer in order {
        let mut ids = std::mem::take(&mut workspace.layers[layer]);
        for &id in &ids {
            let positions = neighbor_positions(workspace, id, top_down);
            let current = workspace.data(id).position as f32;
            workspace.data_mut(id).measure = weighted_median(&positions).unwrap_or(current);
        }
        // Stable: ties keep their current relative order.
        ids.sort_by(|a, b| workspace.data(*a).measure.total_cmp(&workspace.data(*b).measure));
        for (position, &id) in ids.iter().enumerate() {
            workspace.data_mut(id).position = position;
        }
        workspace.layers[layer] = ids;
    }
}

/// Crossings between the edges of two nodes of one layer towards a
/// neighboring layer, with `left` placed before `right`. Both slices hold
/// sorted neighbor positions.
fn pair_crossings(left: &[usize], right: &[usize]) -> usize {
    let mut smaller = 0;
    let mut crossings = 0;
    for &l in left {
        while smaller < right.len() && right[smaller] < l {
            smaller += 1;
        }
        crossings += smaller;
    }
    crossings
}

/// Swaps adjacent nodes while doing so strictly reduces crossings.
///
/// Swapping two nodes only changes the crossings among their own edges, and
/// leaves the neighboring layers untouched, so each layer's neighbor
/// positions are gathered once per pass.
fn transpose(workspace: &mut Workspace) {
    let mut improved = true;
    while improved {
        improved = false;
        for layer in 0..workspace.layers.len() {
            let mut ids = std::mem::take(&mut workspace.layers[layer]);
            let mut above: Vec<Vec<usize>> = ids
                .iter()
                .map(|&id| neighbor_positions(workspace, id, true))
                .collect();
            let mut below: Vec<Vec<usize>> = ids
                .iter()
                .map(|&id| neighbor_positions(workspace, id, false))
                .collect();

            for idx in 1..ids.len() {
                let before = pair_crossings(&above[idx - 1], &above[idx])
                    + pair_crossings(&below[idx - 1], &below[idx]);
                let after = pair_crossings(&above[idx], &above[idx - 1])
                    + pair_crossings(&below[idx], &below[idx - 1]);
                if after < before {
                    ids.swap(idx - 1, idx);
                    above.swap(idx - 1, idx);
                    below.swap(idx - 1, idx);
                    improved = true;
                }
            }

            for (position, &id) in ids.iter().enumerate() {
                workspace.data_mut(id).position = position;
            }
            workspace.layers[layer] = ids;
        }
    }
}

/// Crossings between two adjacent layers; edges must span exactly one layer.
///
/// Segments are sorted by their upper end; every earlier segment whose lower
/// end lies further right crosses the current one. Those are counted with a
/// Fenwick tree over lower positions.
fn layer_crossings(workspace: &Workspace, upper: &[Id]) -> usize {
    let mut segments: Vec<(usize, usize)> = upper
        .iter()
        .flat_map(|&id| {
            let from = workspace.data(id).position;
            workspace
                .graph
                .successors(id)
                .iter()
                .map(move |&target| (from, workspace.data(target).position))
        })
        .collect();
    segments.sort_unstable();

    let width = segments.iter().map(|&(_, to)| to + 1).max().unwrap_or(0);
    let mut tree = vec![0usize; width + 1];
    let mut crossings = 0;
    for (seen, &(_, to)) in segments.iter().enumerate() {
        let mut at_most = 0;
        let mut idx = to + 1;
        while idx > 0 {
            at_most += tree[idx];
            idx &= idx - 1;
        }
        crossings += seen - at_most;

        let mut idx = to + 1;
        while idx <= width {
            tree[idx] += 1;
            idx += idx & idx.wrapping_neg();
        }
    }
    crossings
}

pub(super) fn total_crossings(workspace: &Workspace) -> usize {
    workspace
        .layers
        .iter()
        .map(|layer| layer_crossings(workspace, layer))
        .sum()
}
