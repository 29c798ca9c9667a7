//! Layout engines and the builder that selects between them.

mod engines;

pub use engines::{
    Engine, EngineBuilder,
    force::Engine as ForceEngine,
    sugiyama::{Engine as LayeredEngine, LayeringReport},
};
