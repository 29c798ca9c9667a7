//! Working state of one layered run.

use std::collections::{HashMap, HashSet};

use strata_core::{
    graph::{Edge, EdgeIdentity, Graph, Node},
    identifier::Id,
};

/// Annotations the pipeline attaches to every working node.
#[derive(Debug, Clone, Default)]
pub(super) struct NodeData {
    /// Layer index, 0 being the top layer.
    pub(super) layer: usize,
    /// Index within the layer.
    pub(super) position: usize,
    /// Key of the long edge this dummy stands in for.
    pub(super) chain: Option<Id>,
    /// Edges into this node that were reversed to break cycles, as
    /// `(original source, working key)`.
    pub(super) reversed: Vec<(Id, Id)>,
    /// Sort key used by crossing reduction.
    pub(super) measure: f32,
}

impl NodeData {
    pub(super) fn is_dummy(&self) -> bool {
        self.chain.is_some()
    }
}

/// A private copy of the caller's graph plus per-node annotations.
///
/// Self-loops are left out. Every working edge carries a key so parallel
/// edges survive reversal; `origins` maps each key back to the caller's edge.
/// Working edges must be added and removed through the workspace so the
/// endpoint index stays in sync with the graph.
#[derive(Debug)]
pub(super) struct Workspace {
    pub(super) graph: Graph,
    pub(super) data: HashMap<Id, NodeData>,
    pub(super) layers: Vec<Vec<Id>>,
    pub(super) origins: HashMap<Id, EdgeIdentity>,
    /// Keys of the working edges leaving and entering each node.
    out_keys: HashMap<Id, Vec<Id>>,
    in_keys: HashMap<Id, Vec<Id>>,
    next_anonymous: usize,
}

impl Workspace {
    pub(super) fn from_graph(source: &Graph) -> Self {
        let mut workspace = Self {
            graph: Graph::new(),
            data: HashMap::with_capacity(source.node_count()),
            layers: Vec::new(),
            origins: HashMap::new(),
            out_keys: HashMap::with_capacity(source.node_count()),
            in_keys: HashMap::with_capacity(source.node_count()),
            next_anonymous: 0,
        };

        for node in source.nodes() {
            workspace.graph.add_node(node.clone());
            workspace.data.insert(node.id(), NodeData::default());
        }

        // Reserve caller keys first so fresh keys cannot collide with them.
        for edge in source.edges().filter(|edge| !edge.is_self_loop()) {
            if let Some(key) = edge.key() {
                workspace.origins.insert(key, edge.identity());
            }
        }
        for edge in source.edges().filter(|edge| !edge.is_self_loop()) {
            let key = match edge.key() {
                Some(key) => key,
                None => {
                    let key = workspace.fresh_id();
                    workspace.origins.insert(key, edge.identity());
                    key
                }
            };
            workspace.insert_edge(Edge::new(edge.source(), edge.target()).with_key(key));
        }

        workspace
    }

    /// An anonymous id used by neither a node nor an edge key.
    pub(super) fn fresh_id(&mut self) -> Id {
        loop {
            let id = Id::from_anonymous(self.next_anonymous);
            self.next_anonymous += 1;
            let taken = self.graph.contains_node(id)
                || self.origins.contains_key(&id)
                || self.graph.edge(&EdgeIdentity::Key(id)).is_some();
            if !taken {
                return id;
            }
        }
    }

    pub(super) fn data(&self, id: Id) -> &NodeData {
        self.data
            .get(&id)
            .expect("Every working node must carry layout data")
    }

    pub(super) fn data_mut(&mut self, id: Id) -> &mut NodeData {
        self.data
            .get_mut(&id)
            .expect("Every working node must carry layout data")
    }

    /// Adds a zero-sized dummy standing in for the edge `chain` on `layer`.
    pub(super) fn add_dummy(&mut self, chain: Id, layer: usize) -> Id {
        let id = self.fresh_id();
        self.graph.add_node(Node::new(id));
        self.data.insert(
            id,
            NodeData {
                layer,
                chain: Some(chain),
                ..NodeData::default()
            },
        );
        self.layers[layer].push(id);
        id
    }

    /// Adds a working edge under a fresh key.
    pub(super) fn connect(&mut self, source: Id, target: Id) -> Id {
        let key = self.fresh_id();
        self.insert_edge(Edge::new(source, target).with_key(key));
        key
    }

    /// Inserts a keyed working edge whose key is known to be free.
    pub(super) fn insert_edge(&mut self, edge: Edge) {
        let key = edge.key().expect("Working edges always carry a key");
        let (source, target) = (edge.source(), edge.target());
        if let Err(err) = self.graph.add_edge(edge) {
            panic!("Working edge keys must be unique: {err}");
        }
        self.out_keys.entry(source).or_default().push(key);
        self.in_keys.entry(target).or_default().push(key);
    }

    /// Removes the working edge `key`.
    pub(super) fn take_edge(&mut self, key: Id) -> Option<Edge> {
        let edge = self.graph.remove_edge(&EdgeIdentity::Key(key))?;
        self.unindex(&edge);
        Some(edge)
    }

    /// Removes several working edges in one pass over the graph.
    pub(super) fn take_edges(&mut self, keys: impl IntoIterator<Item = Id>) -> Vec<Edge> {
        let identities: HashSet<EdgeIdentity> = keys.into_iter().map(EdgeIdentity::Key).collect();
        let removed = self.graph.remove_edges(&identities);
        for edge in &removed {
            self.unindex(edge);
        }
        removed
    }

    /// Removes nodes together with every working edge touching them.
    pub(super) fn remove_nodes(&mut self, ids: &HashSet<Id>) {
        let touching: HashSet<Id> = ids
            .iter()
            .flat_map(|id| self.out_keys.get(id).into_iter().chain(self.in_keys.get(id)))
            .flatten()
            .copied()
            .collect();
        self.take_edges(touching);
        self.graph.remove_nodes(ids.iter().copied());
        for id in ids {
            self.out_keys.remove(id);
            self.in_keys.remove(id);
            self.data.remove(id);
        }
    }

    fn unindex(&mut self, edge: &Edge) {
        let Some(key) = edge.key() else {
            return;
        };
        for (index, endpoint) in [(&mut self.out_keys, edge.source()), (&mut self.in_keys, edge.target())] {
            if let Some(keys) = index.get_mut(&endpoint) {
                keys.retain(|&other| other != key);
            }
        }
    }

    /// Outgoing working edges of `id` as `(key, target)` pairs.
    pub(super) fn outgoing(&self, id: Id) -> Vec<(Id, Id)> {
        self.out_keys
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|&key| {
                let edge = self.graph.edge(&EdgeIdentity::Key(key))?;
                Some((key, edge.target()))
            })
            .collect()
    }

    /// The only outgoing working edge of `id`, if it has exactly one.
    pub(super) fn sole_outgoing(&self, id: Id) -> Option<&Edge> {
        Self::sole(self.endpoint_edges(&self.out_keys, id))
    }

    /// The only incoming working edge of `id`, if it has exactly one.
    pub(super) fn sole_incoming(&self, id: Id) -> Option<&Edge> {
        Self::sole(self.endpoint_edges(&self.in_keys, id))
    }

    fn sole<'a>(mut edges: impl Iterator<Item = &'a Edge>) -> Option<&'a Edge> {
        let first = edges.next()?;
        edges.next().is_none().then_some(first)
    }

    fn endpoint_edges<'a>(
        &'a self,
        index: &'a HashMap<Id, Vec<Id>>,
        id: Id,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        index
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|&key| self.graph.edge(&EdgeIdentity::Key(key)))
    }

    /// Recomputes every node's index within its layer.
    pub(super) fn index_layers(&mut self) {
        for layer in &self.layers {
            for (position, id) in layer.iter().enumerate() {
                if let Some(data) = self.data.get_mut(id) {
                    data.position = position;
                }
            }
        }
    }
}
