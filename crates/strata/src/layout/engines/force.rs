//! Force-directed layout engine
//!
//! A Fruchterman–Reingold spring simulation: edges pull their endpoints
//! together, every pair of nodes pushes apart, and a cooling temperature caps
//! how far a node may move per iteration. Repulsion is either computed
//! exactly or approximated with a Barnes–Hut quadtree.

mod clusters;
mod engine;
mod forces;
mod quadtree;

pub use engine::Engine;
