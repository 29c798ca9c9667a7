//! Configuration types for the Strata layout engines.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources; every field falls back to its default when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`LayoutConfig`] - Selects the [`EngineKind`] and holds per-engine options.
//! - [`ForceConfig`] - Options of the force-directed engine.
//! - [`LayeredConfig`] - Options of the layered engine.
//!
//! # Example
//!
//! ```
//! # use strata::config::{AppConfig, EngineKind};
//! let config = AppConfig::default();
//! assert_eq!(config.layout().engine(), EngineKind::Force);
//! assert!(config.validate().is_ok());
//! ```

use std::str::FromStr;

use serde::Deserialize;

use crate::StrataError;

/// Top-level configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout configuration.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the layout configuration for modification.
    pub fn layout_mut(&mut self) -> &mut LayoutConfig {
        &mut self.layout
    }

    /// Checks every numeric option for values the engines cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] naming the first offending option.
    pub fn validate(&self) -> Result<(), StrataError> {
        self.layout.force.validate()?;
        self.layout.layered.validate()
    }
}

/// Available layout engines.
///
/// The names match external configuration strings (snake_case).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Fruchterman–Reingold spring simulation (default)
    #[default]
    Force,
    /// Sugiyama-style hierarchical layout
    Layered,
}

impl FromStr for EngineKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force" => Ok(Self::Force),
            "layered" | "sugiyama" => Ok(Self::Layered),
            _ => Err("Unsupported layout engine"),
        }
    }
}

impl From<EngineKind> for &'static str {
    fn from(val: EngineKind) -> Self {
        match val {
            EngineKind::Force => "force",
            EngineKind::Layered => "layered",
        }
    }
}

/// Layout section: which engine runs and how each engine is tuned.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    engine: EngineKind,

    #[serde(default)]
    force: ForceConfig,

    #[serde(default)]
    layered: LayeredConfig,
}

impl LayoutConfig {
    pub fn new(engine: EngineKind, force: ForceConfig, layered: LayeredConfig) -> Self {
        Self {
            engine,
            force,
            layered,
        }
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn set_engine(&mut self, engine: EngineKind) {
        self.engine = engine;
    }

    pub fn force(&self) -> &ForceConfig {
        &self.force
    }

    pub fn layered(&self) -> &LayeredConfig {
        &self.layered
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), StrataError> {
    if condition {
        Ok(())
    } else {
        Err(StrataError::Config(message.to_string()))
    }
}

/// Options of the force-directed engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Maximum number of simulation iterations per `run`.
    pub iterations: usize,
    /// Scale of the spring force pulling connected nodes together.
    pub attraction_rate: f32,
    /// Fraction of the ideal edge length below which springs are slack.
    pub attraction_percentage: f32,
    /// Scale of the force pushing every pair of nodes apart.
    pub repulsion_rate: f32,
    /// Fraction of the working area's half-perimeter over which repulsion
    /// acts at full strength. It fades to zero at twice that distance.
    pub repulsion_percentage: f32,
    /// Gap between the bounding boxes of disconnected clusters.
    pub cluster_padding: f32,
    /// Convergence threshold for the temperature, relative to the working area.
    pub convergence_epsilon: f32,
    /// Displacement below which `step` reports the layout as settled.
    pub movement_threshold: f32,
    /// Scatter nodes randomly over the working area on `init`.
    pub randomize: bool,
    /// Seed for the scatter; the OS entropy source is used when absent.
    pub seed: Option<u64>,
    /// Approximate repulsion with a Barnes–Hut quadtree.
    pub barnes_hut: bool,
    /// Barnes–Hut accuracy threshold; lower is more accurate.
    pub theta: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            attraction_rate: 0.15,
            attraction_percentage: 0.15,
            repulsion_rate: 0.2,
            repulsion_percentage: 0.75,
            cluster_padding: 15.0,
            convergence_epsilon: 0.001,
            movement_threshold: 0.5,
            randomize: true,
            seed: None,
            barnes_hut: false,
            theta: 0.5,
        }
    }
}

impl ForceConfig {
    fn validate(&self) -> Result<(), StrataError> {
        ensure(
            self.attraction_rate.is_finite() && self.attraction_rate >= 0.0,
            "force.attraction_rate must be a non-negative number",
        )?;
        ensure(
            self.attraction_percentage.is_finite() && self.attraction_percentage >= 0.0,
            "force.attraction_percentage must be a non-negative number",
        )?;
        ensure(
            self.repulsion_rate.is_finite() && self.repulsion_rate >= 0.0,
            "force.repulsion_rate must be a non-negative number",
        )?;
        ensure(
            self.repulsion_percentage.is_finite() && self.repulsion_percentage > 0.0,
            "force.repulsion_percentage must be positive",
        )?;
        ensure(
            self.cluster_padding.is_finite() && self.cluster_padding >= 0.0,
            "force.cluster_padding must be a non-negative number",
        )?;
        ensure(
            self.convergence_epsilon.is_finite() && self.convergence_epsilon >= 0.0,
            "force.convergence_epsilon must be a non-negative number",
        )?;
        ensure(
            self.movement_threshold.is_finite() && self.movement_threshold >= 0.0,
            "force.movement_threshold must be a non-negative number",
        )?;
        ensure(
            self.theta.is_finite() && self.theta >= 0.0,
            "force.theta must be a non-negative number",
        )
    }
}

/// Direction in which successive layers are stacked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Roots at the top, layers grow downwards (default)
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Orientation {
    /// Whether layers are stacked along the y axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TopBottom | Self::BottomTop)
    }
}

/// How a renderer should draw edges through their bend points.
///
/// The layered engine does not interpret this; it is carried for consumers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRouting {
    /// Straight segments between bend points (default)
    #[default]
    Angular,
    /// Smooth curves through the bend points
    Curved,
}

/// Options of the layered engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayeredConfig {
    /// Gap between neighbouring nodes that share a parent.
    pub node_separation: f32,
    /// Gap between consecutive layers.
    pub level_separation: f32,
    /// Gap between neighbouring nodes that do not share a parent.
    pub subtree_separation: f32,
    pub orientation: Orientation,
    pub routing: EdgeRouting,
    /// Number of median/transpose sweeps in crossing reduction.
    pub crossing_iterations: usize,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            node_separation: 20.0,
            level_separation: 50.0,
            subtree_separation: 30.0,
            orientation: Orientation::default(),
            routing: EdgeRouting::default(),
            crossing_iterations: 10,
        }
    }
}

impl LayeredConfig {
    fn validate(&self) -> Result<(), StrataError> {
        ensure(
            self.node_separation.is_finite() && self.node_separation >= 0.0,
            "layered.node_separation must be a non-negative number",
        )?;
        ensure(
            self.level_separation.is_finite() && self.level_separation >= 0.0,
            "layered.level_separation must be a non-negative number",
        )?;
        ensure(
            self.subtree_separation.is_finite() && self.subtree_separation >= 0.0,
            "layered.subtree_separation must be a non-negative number",
        )
    }
}
