//! Attraction and repulsion laws of the simulation.

use std::f32::consts::PI;

use strata_core::geometry::{Bounds, Point};

use super::quadtree::{Body, QuadTree};

/// Distances are floored at this value before dividing by them.
pub(super) const MIN_DISTANCE: f32 = 1e-4;

/// Angle between successive tie-break directions for coincident bodies.
const GOLDEN_ANGLE: f32 = PI * (3.0 - 2.236_068);

/// Constants shared by every force evaluation of one iteration.
#[derive(Debug, Clone, Copy)]
pub(super) struct ForceParams {
    /// Ideal edge length.
    pub(super) k: f32,
    pub(super) attraction_rate: f32,
    /// Edges shorter than this exert no pull.
    pub(super) attraction_slack: f32,
    pub(super) repulsion_rate: f32,
    /// Repulsion starts fading at this distance and vanishes at twice of it.
    pub(super) repulsion_range: f32,
    pub(super) theta: f32,
}

impl ForceParams {
    fn repulsion(&self, distance: f32, mass: f32) -> f32 {
        let distance = distance.max(MIN_DISTANCE);
        let falloff = (2.0 - distance / self.repulsion_range).clamp(0.0, 1.0);
        self.repulsion_rate * mass * self.k * self.k / distance * falloff
    }

    /// Pull exerted on `source` by an edge to `target`; `target` receives the opposite.
    pub(super) fn attraction(&self, source: Point, target: Point) -> Point {
        let delta = target.sub_point(source);
        let distance = delta.hypot();
        if distance < self.attraction_slack || distance < MIN_DISTANCE {
            return Point::default();
        }
        let magnitude = self.attraction_rate * distance * distance / self.k;
        delta.scale(magnitude / distance)
    }
}

/// Adds the exact pairwise repulsion of every unordered pair to `displacement`.
///
/// The distance is measured between the node rectangles, so overlapping
/// nodes push each other apart at full strength.
pub(super) fn naive_repulsion(
    centers: &[Point],
    bounds: &[Bounds],
    params: &ForceParams,
    displacement: &mut [Point],
) {
    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            let delta = centers[i].sub_point(centers[j]);
            let center_distance = delta.hypot();
            let direction = if center_distance < MIN_DISTANCE {
                Point::new(-1.0, 0.0)
            } else {
                delta.scale(1.0 / center_distance)
            };
            let magnitude = params.repulsion(bounds[i].gap(bounds[j]).hypot(), 1.0);
            let push = direction.scale(magnitude);
            displacement[i] = displacement[i].add_point(push);
            displacement[j] = displacement[j].sub_point(push);
        }
    }
}

/// Approximate repulsion felt by `query` from every other body in `tree`.
///
/// Cells far enough away (extent / distance below theta) act as a single
/// point mass at their center of mass. Cells containing the query are always
/// opened.
pub(super) fn barnes_hut_repulsion(tree: &QuadTree, query: Body, params: &ForceParams) -> Point {
    let mut force = Point::default();
    let mut pending = vec![0];

    while let Some(idx) = pending.pop() {
        let cell = tree.cell(idx);
        if cell.is_empty() {
            continue;
        }

        let mut mass = cell.mass();
        if cell.is_leaf() && cell.holds(query.index) {
            mass -= 1.0;
            if mass < 0.5 {
                continue;
            }
        }

        let delta = query.position.sub_point(cell.center_of_mass());
        let distance = delta.hypot();
        let far = !cell.bounds().contains(query.position)
            && cell.extent() / distance.max(MIN_DISTANCE) < params.theta;

        match cell.children() {
            Some(children) if !far => pending.extend(children),
            _ => {
                let direction = if distance < MIN_DISTANCE {
                    let angle = query.index as f32 * GOLDEN_ANGLE;
                    Point::new(angle.cos(), angle.sin())
                } else {
                    delta.scale(1.0 / distance)
                };
                force = force.add_point(direction.scale(params.repulsion(distance, mass)));
            }
        }
    }

    force
}
