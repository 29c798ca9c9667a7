//! In-memory graph model shared by the layout engines.
//!
//! # Architecture
//!
//! - [`Node`]: a keyed rectangle with a mutable center position and size
//! - [`Edge`]: a directed connection with an optional key and bend points
//! - [`Graph`]: ordered node and edge storage with lazily built adjacency
//!
//! Capabilities:
//! - Insertion-ordered node storage doubling as an O(1) membership set
//! - Edge identity by key, or by endpoint pair when no key is given
//! - Cascading removal of incident edges (and of descendants for trees)
//! - Successor / predecessor queries served from a cache that structural
//!   mutations discard
//! - A generation counter consumers use to detect stale derived views

use std::{
    cell::OnceCell,
    collections::{HashMap, HashSet},
};

use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

use crate::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// Errors raised by graph mutations.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Edge key `{key}` is already used by {from} -> {to}")]
    EdgeKeyConflict { key: Id, from: Id, to: Id },
}

/// A graph node: an opaque key plus the geometry the engines compute.
///
/// Equality and hashing only consider the key.
#[derive(Debug, Clone)]
pub struct Node {
    id: Id,
    position: Point,
    size: Size,
    locked: bool,
}

impl Node {
    /// Creates a zero-sized node at the origin.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            position: Point::default(),
            size: Size::default(),
            locked: false,
        }
    }

    /// Set the size for this node (builder style).
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Set the center position for this node (builder style).
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Center of the node.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Whether interactive repositioning (dragging) is disabled for this node.
    ///
    /// The layout engines do not consult this flag.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Rectangle covered by the node.
    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// What makes two edges "the same edge".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeIdentity {
    /// Explicit caller-supplied key.
    Key(Id),
    /// Structural identity: the ordered endpoint pair.
    Endpoints(Id, Id),
}

/// A directed edge.
///
/// Endpoints and key are fixed at construction; only the bend points can be
/// changed afterwards, so an edge never changes identity while stored in a
/// [`Graph`].
#[derive(Debug, Clone)]
pub struct Edge {
    source: Id,
    target: Id,
    key: Option<Id>,
    bend_points: Option<Vec<Point>>,
}

impl Edge {
    /// Creates an unkeyed edge; its identity is the endpoint pair.
    pub fn new(source: Id, target: Id) -> Self {
        Self {
            source,
            target,
            key: None,
            bend_points: None,
        }
    }

    /// Set an explicit identity key (builder style).
    pub fn with_key(mut self, key: Id) -> Self {
        self.key = Some(key);
        self
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn key(&self) -> Option<Id> {
        self.key
    }

    pub fn identity(&self) -> EdgeIdentity {
        match self.key {
            Some(key) => EdgeIdentity::Key(key),
            None => EdgeIdentity::Endpoints(self.source, self.target),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Routing points between source and target, in source-to-target order.
    pub fn bend_points(&self) -> Option<&[Point]> {
        self.bend_points.as_deref()
    }

    pub fn set_bend_points(&mut self, bend_points: Option<Vec<Point>>) {
        self.bend_points = bend_points;
    }

    /// Returns the same edge pointing the other way.
    ///
    /// The key is kept and the bend points are reversed so they still run
    /// from the (new) source to the (new) target.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            key: self.key,
            bend_points: self.bend_points.as_ref().map(|points| {
                let mut points = points.clone();
                points.reverse();
                points
            }),
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    successors: HashMap<Id, Vec<Id>>,
    predecessors: HashMap<Id, Vec<Id>>,
}

impl Adjacency {
    fn build<'a>(edges: impl Iterator<Item = &'a Edge>) -> Self {
        let mut adjacency = Self::default();
        for edge in edges {
            let successors = adjacency.successors.entry(edge.source).or_default();
            if !successors.contains(&edge.target) {
                successors.push(edge.target);
            }
            let predecessors = adjacency.predecessors.entry(edge.target).or_default();
            if !predecessors.contains(&edge.source) {
                predecessors.push(edge.source);
            }
        }
        adjacency
    }
}

/// Directed graph of sized nodes.
///
/// The graph is directed and allows self-loops. Parallel edges between the
/// same ordered pair are allowed only when they carry distinct keys.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<Id, Node>,
    edges: IndexMap<EdgeIdentity, Edge>,
    is_tree: bool,
    generation: u64,
    adjacency: OnceCell<Adjacency>,
}

impl Graph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty graph whose node removal cascades to descendants.
    pub fn new_tree() -> Self {
        Self {
            is_tree: true,
            ..Self::default()
        }
    }

    pub fn is_tree(&self) -> bool {
        self.is_tree
    }

    pub fn set_tree(&mut self, is_tree: bool) {
        self.is_tree = is_tree;
    }

    /// Monotonic counter bumped by every mutation and by [`Graph::mark_modified`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signals that node geometry changed while the topology did not.
    ///
    /// Advances the generation without discarding the adjacency cache.
    pub fn mark_modified(&mut self) {
        self.generation += 1;
    }

    fn structure_changed(&mut self) {
        self.generation += 1;
        self.adjacency.take();
    }

    fn adjacency(&self) -> &Adjacency {
        self.adjacency
            .get_or_init(|| Adjacency::build(self.edges.values()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over all node keys in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.keys().copied()
    }

    /// Mutable access to every node.
    ///
    /// Does not advance the generation; call [`Graph::mark_modified`] after
    /// moving nodes.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Position of the node in insertion order.
    pub fn node_index(&self, id: Id) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Adds a node. Returns false (and keeps the existing node) if the key is taken.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id, node);
        self.structure_changed();
        true
    }

    /// Removes a node together with its incident edges.
    ///
    /// For trees, every node reachable from `id` through successor edges is
    /// removed as well.
    pub fn remove_node(&mut self, id: Id) -> Option<Node> {
        let node = self.nodes.get(&id)?.clone();
        self.remove_nodes([id]);
        Some(node)
    }

    /// Removes several nodes and all their incident edges in a single pass
    /// over the graph. Unknown ids are ignored.
    ///
    /// Cascades to descendants for trees, like [`Graph::remove_node`].
    /// Returns the number of nodes removed.
    pub fn remove_nodes(&mut self, ids: impl IntoIterator<Item = Id>) -> usize {
        let mut doomed: HashSet<Id> = HashSet::new();
        let mut stack: Vec<Id> = ids
            .into_iter()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        while let Some(current) = stack.pop() {
            if !doomed.insert(current) {
                continue;
            }
            if self.is_tree {
                stack.extend_from_slice(self.successors(current));
            }
        }
        if doomed.is_empty() {
            return 0;
        }
        trace!(removed_count = doomed.len(); "Removing nodes");

        self.edges
            .retain(|_, edge| !doomed.contains(&edge.source) && !doomed.contains(&edge.target));
        self.nodes.retain(|id, _| !doomed.contains(id));
        self.structure_changed();
        doomed.len()
    }

    /// Returns an iterator over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Mutable access to every edge (only bend points are mutable on [`Edge`]).
    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut()
    }

    pub fn edge(&self, identity: &EdgeIdentity) -> Option<&Edge> {
        self.edges.get(identity)
    }

    pub fn edge_mut(&mut self, identity: &EdgeIdentity) -> Option<&mut Edge> {
        self.edges.get_mut(identity)
    }

    /// Returns the first edge from `source` to `target`, if any.
    pub fn edge_between(&self, source: Id, target: Id) -> Option<&Edge> {
        self.edges
            .values()
            .find(|edge| edge.source == source && edge.target == target)
    }

    /// Adds an edge, registering missing endpoints as zero-sized nodes.
    ///
    /// Returns `Ok(false)` when an equal edge with the same endpoints is
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeKeyConflict`] if the edge's key already
    /// identifies an edge between different endpoints.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool, GraphError> {
        let identity = edge.identity();
        if let Some(existing) = self.edges.get(&identity) {
            if existing.source == edge.source && existing.target == edge.target {
                return Ok(false);
            }
            if let EdgeIdentity::Key(key) = identity {
                return Err(GraphError::EdgeKeyConflict {
                    key,
                    from: existing.source,
                    to: existing.target,
                });
            }
        }

        for endpoint in [edge.source, edge.target] {
            if !self.nodes.contains_key(&endpoint) {
                self.nodes.insert(endpoint, Node::new(endpoint));
            }
        }
        self.edges.insert(identity, edge);
        self.structure_changed();
        Ok(true)
    }

    /// Adds an unkeyed edge. Returns false if it already existed.
    pub fn connect(&mut self, source: Id, target: Id) -> bool {
        // Unkeyed identities are the endpoint pair itself, so they cannot conflict.
        self.add_edge(Edge::new(source, target)).unwrap_or(false)
    }

    pub fn remove_edge(&mut self, identity: &EdgeIdentity) -> Option<Edge> {
        let removed = self.edges.shift_remove(identity)?;
        self.structure_changed();
        Some(removed)
    }

    /// Removes every edge whose identity is in `identities` in one pass,
    /// returning the removed edges in insertion order.
    pub fn remove_edges(&mut self, identities: &HashSet<EdgeIdentity>) -> Vec<Edge> {
        let mut removed = Vec::new();
        self.edges.retain(|identity, edge| {
            let keep = !identities.contains(identity);
            if !keep {
                removed.push(edge.clone());
            }
            keep
        });
        if !removed.is_empty() {
            self.structure_changed();
        }
        removed
    }

    /// Nodes reachable from `id` through one outgoing edge.
    pub fn successors(&self, id: Id) -> &[Id] {
        self.adjacency()
            .successors
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes with an edge into `id`.
    pub fn predecessors(&self, id: Id) -> &[Id] {
        self.adjacency()
            .predecessors
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a direct edge `source -> target` exists.
    pub fn has_edge(&self, source: Id, target: Id) -> bool {
        self.successors(source).contains(&target)
    }

    /// Nodes without predecessors, in insertion order.
    pub fn roots(&self) -> Vec<Id> {
        self.node_ids()
            .filter(|&id| self.predecessors(id).is_empty())
            .collect()
    }

    /// Smallest rectangle covering every node, or `None` for an empty graph.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes
            .values()
            .map(Node::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Id {
        Id::new(name)
    }

    #[test]
    fn test_add_edge_registers_endpoints() {
        let mut graph = Graph::new();
        assert_eq!(graph.add_edge(Edge::new(id("a"), id("b"))), Ok(true));

        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains_node(id("a")));
        assert!(graph.contains_node(id("b")));
        assert_eq!(graph.successors(id("a")), &[id("b")]);
        assert_eq!(graph.predecessors(id("b")), &[id("a")]);
        assert!(graph.has_edge(id("a"), id("b")));
        assert!(!graph.has_edge(id("b"), id("a")));
    }

    #[test]
    fn test_duplicate_unkeyed_edge_is_noop() {
        let mut graph = Graph::new();
        assert!(graph.connect(id("a"), id("b")));
        let generation = graph.generation();

        assert!(!graph.connect(id("a"), id("b")));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.generation(), generation);
    }

    #[test]
    fn test_keyed_parallel_edges() {
        let mut graph = Graph::new();
        let first = Edge::new(id("a"), id("b")).with_key(id("e1"));
        let second = Edge::new(id("a"), id("b")).with_key(id("e2"));

        assert_eq!(graph.add_edge(first), Ok(true));
        assert_eq!(graph.add_edge(second), Ok(true));
        assert_eq!(graph.edge_count(), 2);
        // Adjacency lists stay duplicate-free
        assert_eq!(graph.successors(id("a")), &[id("b")]);
    }

    #[test]
    fn test_edge_key_conflict() {
        let mut graph = Graph::new();
        graph
            .add_edge(Edge::new(id("a"), id("b")).with_key(id("shared")))
            .unwrap();

        let result = graph.add_edge(Edge::new(id("b"), id("c")).with_key(id("shared")));
        assert_eq!(
            result,
            Err(GraphError::EdgeKeyConflict {
                key: id("shared"),
                from: id("a"),
                to: id("b"),
            })
        );
        assert!(!graph.contains_node(id("c")));
    }

    #[test]
    fn test_edge_equality() {
        let plain = Edge::new(id("a"), id("b"));
        assert_eq!(plain, Edge::new(id("a"), id("b")));
        assert_ne!(plain, Edge::new(id("b"), id("a")));

        let keyed = Edge::new(id("a"), id("b")).with_key(id("k"));
        assert_ne!(plain, keyed);
        assert_eq!(keyed, Edge::new(id("x"), id("y")).with_key(id("k")));
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut graph = Graph::new();
        graph.connect(id("a"), id("b"));
        graph.connect(id("b"), id("c"));
        graph.connect(id("c"), id("a"));

        let removed = graph.remove_node(id("b"));
        assert_eq!(removed.map(|node| node.id()), Some(id("b")));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.successors(id("a")).is_empty());
        assert_eq!(graph.successors(id("c")), &[id("a")]);
        assert!(graph.remove_node(id("b")).is_none());
    }

    #[test]
    fn test_tree_removal_cascades_descendants() {
        let mut graph = Graph::new_tree();
        graph.connect(id("root"), id("left"));
        graph.connect(id("root"), id("right"));
        graph.connect(id("left"), id("leaf"));

        graph.remove_node(id("left"));
        let remaining: Vec<Id> = graph.node_ids().collect();
        assert_eq!(remaining, vec![id("root"), id("right")]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_batch_removal() {
        let mut graph = Graph::new();
        graph.connect(id("a"), id("b"));
        graph.connect(id("b"), id("c"));
        graph.connect(id("c"), id("d"));
        graph
            .add_edge(Edge::new(id("a"), id("d")).with_key(id("direct")))
            .unwrap();
        let generation = graph.generation();

        assert_eq!(graph.remove_nodes([id("b"), id("c"), id("missing")]), 2);
        let remaining: Vec<Id> = graph.node_ids().collect();
        assert_eq!(remaining, vec![id("a"), id("d")]);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(id("a"), id("d")));
        assert!(graph.generation() > generation);

        let doomed = HashSet::from([EdgeIdentity::Key(id("direct"))]);
        let removed = graph.remove_edges(&doomed);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].key(), Some(id("direct")));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_edges(&doomed).is_empty());
        assert_eq!(graph.remove_nodes([]), 0);
    }

    #[test]
    fn test_adjacency_never_stale() {
        let mut graph = Graph::new();
        graph.connect(id("a"), id("b"));
        assert_eq!(graph.successors(id("a")), &[id("b")]);

        graph.connect(id("a"), id("c"));
        assert_eq!(graph.successors(id("a")), &[id("b"), id("c")]);

        graph.remove_edge(&EdgeIdentity::Endpoints(id("a"), id("b")));
        assert_eq!(graph.successors(id("a")), &[id("c")]);
        assert!(graph.predecessors(id("b")).is_empty());
    }

    #[test]
    fn test_generation_tracking() {
        let mut graph = Graph::new();
        let start = graph.generation();

        graph.add_node(Node::new(id("a")));
        graph.connect(id("a"), id("b"));
        assert_eq!(graph.generation(), start + 2);

        graph.mark_modified();
        assert_eq!(graph.generation(), start + 3);
        assert_eq!(graph.successors(id("a")), &[id("b")]);

        assert!(!graph.add_node(Node::new(id("a"))));
        assert_eq!(graph.generation(), start + 3);
    }

    #[test]
    fn test_roots_and_bounds() {
        let mut graph = Graph::new();
        graph.add_node(
            Node::new(id("a"))
                .with_size(Size::new(10.0, 10.0))
                .with_position(Point::new(5.0, 5.0)),
        );
        graph.add_node(
            Node::new(id("b"))
                .with_size(Size::new(4.0, 2.0))
                .with_position(Point::new(20.0, 1.0)),
        );
        graph.connect(id("a"), id("b"));

        assert_eq!(graph.roots(), vec![id("a")]);
        let bounds = graph.bounds().unwrap();
        assert_eq!(bounds.min_point(), Point::new(0.0, 0.0));
        assert_eq!(bounds.to_size(), Size::new(22.0, 10.0));
        assert!(Graph::new().bounds().is_none());
    }

    #[test]
    fn test_edge_reversed_keeps_geometry() {
        let mut edge = Edge::new(id("a"), id("b")).with_key(id("k"));
        edge.set_bend_points(Some(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]));

        let reversed = edge.reversed();
        assert_eq!(reversed.source(), id("b"));
        assert_eq!(reversed.target(), id("a"));
        assert_eq!(reversed.key(), Some(id("k")));
        assert_eq!(
            reversed.bend_points(),
            Some(&[Point::new(2.0, 2.0), Point::new(1.0, 1.0)][..])
        );
    }

    #[test]
    fn test_self_loop() {
        let mut graph = Graph::new();
        graph.connect(id("a"), id("a"));
        assert!(graph.edges().all(Edge::is_self_loop));
        assert!(graph.roots().is_empty());
    }
}
