//! Coordinate assignment for ordered layers.

use log::debug;

use strata_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use super::workspace::Workspace;
use crate::config::{LayeredConfig, Orientation};

/// Extents of a node as (across the layer, along the layer axis).
fn extents(size: Size, vertical: bool) -> (f32, f32) {
    if vertical {
        (size.width(), size.height())
    } else {
        (size.height(), size.width())
    }
}

fn share_predecessor(workspace: &Workspace, left: Id, right: Id) -> bool {
    let right = workspace.graph.predecessors(right);
    workspace
        .graph
        .predecessors(left)
        .iter()
        .any(|parent| right.contains(parent))
}

/// Positions every working node from its layer and in-layer order.
///
/// Layers are stacked along the orientation's axis, each as thick as its
/// largest node plus `level_separation`. Within a layer, siblings sharing a
/// predecessor are `node_separation` apart, other neighbors
/// `subtree_separation`. Every layer is centered on the widest one.
pub(super) fn assign_coordinates(workspace: &mut Workspace, config: &LayeredConfig) {
    let vertical = config.orientation.is_vertical();
    let mut placements: Vec<(Id, f32, f32)> = Vec::with_capacity(workspace.graph.node_count());
    let mut layer_spans: Vec<(usize, f32)> = Vec::with_capacity(workspace.layers.len());
    let mut main_cursor: f32 = 0.0;

    for layer in &workspace.layers {
        let thickness = layer
            .iter()
            .filter_map(|&id| workspace.graph.node(id))
            .map(|node| extents(node.size(), vertical).1)
            .fold(0.0, f32::max);
        let main = main_cursor + thickness / 2.0;

        let first = placements.len();
        let mut cross: f32 = 0.0;
        let mut previous: Option<Id> = None;
        for &id in layer {
            let size = workspace
                .graph
                .node(id)
                .map(|node| node.size())
                .unwrap_or_default();
            let (width, _) = extents(size, vertical);
            if let Some(previous) = previous {
                cross += if share_predecessor(workspace, previous, id) {
                    config.node_separation
                } else {
                    config.subtree_separation
                };
            }
            placements.push((id, cross + width / 2.0, main));
            cross += width;
            previous = Some(id);
        }

        layer_spans.push((first, cross));
        main_cursor += thickness + config.level_separation;
    }

    let total_main = (main_cursor - config.level_separation).max(0.0);
    let widest = layer_spans.iter().map(|&(_, width)| width).fold(0.0, f32::max);
    for (layer, &(first, width)) in layer_spans.iter().enumerate() {
        let end = layer_spans
            .get(layer + 1)
            .map_or(placements.len(), |&(next, _)| next);
        let centering = (widest - width) / 2.0;
        for placement in &mut placements[first..end] {
            placement.1 += centering;
        }
    }

    for (id, cross, main) in placements {
        let main = match config.orientation {
            Orientation::TopBottom | Orientation::LeftRight => main,
            Orientation::BottomTop | Orientation::RightLeft => total_main - main,
        };
        let position = if vertical {
            Point::new(cross, main)
        } else {
            Point::new(main, cross)
        };
        if let Some(node) = workspace.graph.node_mut(id) {
            node.set_position(position);
        }
    }
    debug!(orientation:? = config.orientation, widest, depth = total_main; "Assigned coordinates");
}

/// Moves the working layout so its top-left corner sits at `shift`.
/// Returns the size of the layout.
pub(super) fn translate_to(workspace: &mut Workspace, shift: Point) -> Size {
    let Some(bounds) = workspace.graph.bounds() else {
        return Size::default();
    };
    let offset = shift.sub_point(bounds.min_point());
    for node in workspace.graph.nodes_mut() {
        node.set_position(node.position().add_point(offset));
    }
    bounds.to_size()
}
