//! Barnes–Hut quadtree over node positions.
//!
//! The tree is stored as an arena of [`Cell`]s; children are always pushed
//! after their parent, so iterating the arena backwards visits every child
//! before its parent.

use log::trace;
use thiserror::Error;

use strata_core::geometry::{Bounds, Point, Size};

/// Subdivision stops at this depth, or earlier once a cell is too small to
/// split; further bodies are folded into the leaf.
pub(super) const MAX_DEPTH: u32 = 30;

/// Mass below which a cell counts as empty.
const MASS_EPSILON: f32 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub(super) enum QuadTreeError {
    #[error("position ({x}, {y}) lies outside the cell bounds")]
    OutOfBounds { x: f32, y: f32 },
}

/// A point mass: the node's index in the graph plus its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Body {
    pub(super) index: usize,
    pub(super) position: Point,
}

#[derive(Debug)]
pub(super) struct Cell {
    bounds: Bounds,
    depth: u32,
    mass: f32,
    center_of_mass: Point,
    body: Option<Body>,
    /// Indices folded into a leaf at the maximum depth.
    folded: Vec<usize>,
    children: Option<[usize; 4]>,
}

impl Cell {
    fn new(bounds: Bounds, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            mass: 0.0,
            center_of_mass: Point::default(),
            body: None,
            folded: Vec::new(),
            children: None,
        }
    }

    pub(super) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(super) fn mass(&self) -> f32 {
        self.mass
    }

    pub(super) fn center_of_mass(&self) -> Point {
        self.center_of_mass
    }

    /// The first body stored in a leaf.
    #[cfg(test)]
    pub(super) fn body(&self) -> Option<Body> {
        self.body
    }

    /// Whether this leaf holds the body with the given index.
    pub(super) fn holds(&self, index: usize) -> bool {
        self.body.is_some_and(|body| body.index == index) || self.folded.contains(&index)
    }

    pub(super) fn children(&self) -> Option<[usize; 4]> {
        self.children
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.mass < MASS_EPSILON
    }

    /// Side length used by the opening criterion.
    pub(super) fn extent(&self) -> f32 {
        self.bounds.width().max(self.bounds.height())
    }

    /// False once halving no longer separates coordinates at f32 precision.
    fn can_split(&self) -> bool {
        let center = self.bounds.center();
        center.x() > self.bounds.min_x()
            && center.x() < self.bounds.max_x()
            && center.y() > self.bounds.min_y()
            && center.y() < self.bounds.max_y()
    }

    fn accumulate(&mut self, position: Point) {
        let total = self.mass + 1.0;
        self.center_of_mass = self
            .center_of_mass
            .scale(self.mass / total)
            .add_point(position.scale(1.0 / total));
        self.mass = total;
    }
}

#[derive(Debug)]
pub(super) struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    /// Creates an empty tree covering `bounds`.
    pub(super) fn new(bounds: Bounds) -> Self {
        Self {
            cells: vec![Cell::new(bounds, 0)],
        }
    }

    /// Builds a tree over all bodies, with a square root cell padded around them.
    ///
    /// # Panics
    ///
    /// Panics if a body cannot be inserted although the root was sized to
    /// contain it, or if a position is not finite.
    pub(super) fn from_bodies(bodies: &[Body]) -> Self {
        let Some(first) = bodies.first() else {
            return Self::new(Bounds::default());
        };
        let covering = bodies
            .iter()
            .fold(first.position.to_bounds(Size::default()), |acc, body| {
                acc.merge(&body.position.to_bounds(Size::default()))
            });
        let side = covering.width().max(covering.height());
        let padding = side * 0.01 + 1.0;
        let root = covering
            .center()
            .to_bounds(Size::new(side, side))
            .expand(padding);

        let mut tree = Self::new(root);
        for body in bodies {
            tree.insert(*body)
                .expect("Root cell must contain every body it was built from");
        }
        // Incremental averaging drifts on deep trees.
        tree.recompute_mass();
        trace!(bodies_count = bodies.len(), cells_count = tree.cells.len(); "Built quadtree");
        tree
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    pub(super) fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    /// Total mass held by the tree; equals the number of inserted bodies.
    pub(super) fn total_mass(&self) -> f32 {
        self.root().mass
    }

    /// Inserts a body.
    ///
    /// # Errors
    ///
    /// Returns [`QuadTreeError::OutOfBounds`] if the position lies outside the
    /// root cell (NaN positions included).
    pub(super) fn insert(&mut self, body: Body) -> Result<(), QuadTreeError> {
        self.insert_into(0, body)
    }

    fn insert_into(&mut self, idx: usize, body: Body) -> Result<(), QuadTreeError> {
        let cell = &self.cells[idx];
        if !cell.bounds.contains(body.position) {
            return Err(QuadTreeError::OutOfBounds {
                x: body.position.x(),
                y: body.position.y(),
            });
        }

        match (cell.children, cell.body) {
            (Some(children), _) => {
                let child = Self::child_for(&self.cells, children, idx, body.position);
                self.insert_child(child, body);
            }
            (None, None) => {
                let cell = &mut self.cells[idx];
                cell.body = Some(body);
                cell.mass = 1.0;
                cell.center_of_mass = body.position;
                return Ok(());
            }
            (None, Some(_)) if cell.depth >= MAX_DEPTH || !cell.can_split() => {
                // Coincident (or nearly so) positions: fold into this leaf.
                self.cells[idx].folded.push(body.index);
            }
            (None, Some(existing)) => {
                let children = self.subdivide(idx);
                self.cells[idx].body = None;
                let existing_child = Self::child_for(&self.cells, children, idx, existing.position);
                self.insert_child(existing_child, existing);
                let child = Self::child_for(&self.cells, children, idx, body.position);
                self.insert_child(child, body);
            }
        }

        self.cells[idx].accumulate(body.position);
        Ok(())
    }

    fn insert_child(&mut self, child: usize, body: Body) {
        if let Err(err) = self.insert_into(child, body) {
            panic!("Quadtree invariant violated, parent contains the body but child rejected it: {err}");
        }
    }

    /// Splits a leaf into four quadrants that share the parent's own edge
    /// values, so every position inside the parent lands inside a child.
    fn subdivide(&mut self, idx: usize) -> [usize; 4] {
        let parent = &self.cells[idx];
        let depth = parent.depth + 1;
        let bounds = parent.bounds;
        let center = bounds.center();
        let xs = [(bounds.min_x(), center.x()), (center.x(), bounds.max_x())];
        let ys = [(bounds.min_y(), center.y()), (center.y(), bounds.max_y())];

        let first = self.cells.len();
        for (min_y, max_y) in ys {
            for (min_x, max_x) in xs {
                let quadrant = Bounds::from_corners(Point::new(min_x, min_y), Point::new(max_x, max_y));
                self.cells.push(Cell::new(quadrant, depth));
            }
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.cells[idx].children = Some(children);
        children
    }

    /// Index of the child quadrant a position belongs to.
    ///
    /// Positions on the split lines go to the west / north quadrant, whose
    /// bounds include that line.
    fn child_for(cells: &[Cell], children: [usize; 4], parent: usize, position: Point) -> usize {
        let center = cells[parent].bounds.center();
        let east = usize::from(position.x() > center.x());
        let south = usize::from(position.y() > center.y());
        children[east + 2 * south]
    }

    /// Recomputes mass and center of mass of every internal cell from its children.
    ///
    /// Leaves keep their own aggregate.
    pub(super) fn recompute_mass(&mut self) {
        for idx in (0..self.cells.len()).rev() {
            let Some(children) = self.cells[idx].children else {
                continue;
            };
            let mut mass = 0.0;
            let mut weighted = Point::default();
            for child in children {
                let child = &self.cells[child];
                mass += child.mass;
                weighted = weighted.add_point(child.center_of_mass.scale(child.mass));
            }
            let cell = &mut self.cells[idx];
            cell.mass = mass;
            if mass >= MASS_EPSILON {
                cell.center_of_mass = weighted.scale(1.0 / mass);
            }
        }
    }

    /// Depth of the deepest cell.
    #[cfg(test)]
    fn max_depth(&self) -> u32 {
        self.cells.iter().map(|cell| cell.depth).max().unwrap_or(0)
    }
}
