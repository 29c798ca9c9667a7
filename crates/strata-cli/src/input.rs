//! Graph input files.
//!
//! A graph file is TOML:
//!
//! ```toml
//! tree = false
//!
//! [[nodes]]
//! id = "parser"
//! width = 80
//! height = 30
//!
//! [[edges]]
//! source = "parser"
//! target = "checker"
//! key = "ast"        # optional, allows parallel edges
//! ```
//!
//! Nodes only mentioned by edges are created with zero size.

use log::debug;
use miette::{NamedSource, SourceSpan};
use serde::Deserialize;

use strata::{
    StrataError,
    geometry::{Point, Size},
    graph::{Edge, Graph, Node},
    identifier::Id,
};

use crate::error::CliError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphFile {
    #[serde(default)]
    tree: bool,
    #[serde(default)]
    nodes: Vec<NodeEntry>,
    #[serde(default)]
    edges: Vec<EdgeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeEntry {
    id: String,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    x: Option<f32>,
    y: Option<f32>,
    #[serde(default)]
    locked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeEntry {
    source: String,
    target: String,
    key: Option<String>,
}

impl NodeEntry {
    fn into_node(self) -> Node {
        let mut node = Node::new(Id::new(&self.id)).with_size(Size::new(self.width, self.height));
        if self.x.is_some() || self.y.is_some() {
            node.set_position(Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)));
        }
        node.set_locked(self.locked);
        node
    }
}

/// Parses a graph file; `name` labels the source in diagnostics.
///
/// # Errors
///
/// Returns [`CliError::Input`] for malformed TOML, negative or non-finite
/// sizes and non-finite positions, and [`CliError::Layout`] when an edge key
/// is reused for different endpoints.
pub fn parse_graph(source: &str, name: &str) -> Result<Graph, CliError> {
    let input_error = |message: String, span: Option<SourceSpan>| CliError::Input {
        message,
        src: NamedSource::new(name, source.to_string()),
        span,
    };

    let file: GraphFile = toml::from_str(source)
        .map_err(|err| input_error(err.message().to_string(), err.span().map(SourceSpan::from)))?;

    let mut graph = if file.tree {
        Graph::new_tree()
    } else {
        Graph::new()
    };

    for entry in file.nodes {
        let valid = |value: f32| value.is_finite() && value >= 0.0;
        if !valid(entry.width) || !valid(entry.height) {
            return Err(input_error(
                format!("node `{}` has an invalid size", entry.id),
                None,
            ));
        }
        if [entry.x, entry.y].into_iter().flatten().any(|value| !value.is_finite()) {
            return Err(input_error(
                format!("node `{}` has a non-finite position", entry.id),
                None,
            ));
        }
        graph.add_node(entry.into_node());
    }

    for entry in file.edges {
        let mut edge = Edge::new(Id::new(&entry.source), Id::new(&entry.target));
        if let Some(key) = &entry.key {
            edge = edge.with_key(Id::new(key));
        }
        graph.add_edge(edge).map_err(StrataError::from)?;
    }

    debug!(
        nodes_count = graph.node_count(),
        edges_count = graph.edge_count(),
        tree = graph.is_tree();
        "Parsed graph file"
    );
    Ok(graph)
}
