use std::f32::consts::TAU;

use log::{debug, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use strata_core::{
    geometry::{Bounds, Point, Size},
    graph::Graph,
};

use super::{
    clusters,
    forces::{self, ForceParams},
    quadtree::{Body, QuadTree},
};
use crate::{config::ForceConfig, layout::engines::Engine as LayoutEngine};

/// Extent assumed for nodes smaller than this when sizing the working area.
const MIN_NODE_EXTENT: f32 = 10.0;

/// Initial temperature, relative to the working area's longest side.
const INITIAL_TEMPERATURE: f32 = 0.1;

/// Temperature multiplier applied after every iteration of `run`.
const COOLING: f32 = 0.99;

/// Radius of the circle coincident nodes are spread on, relative to the
/// working area's longest side.
const SPREAD_RADIUS: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
struct Simulation {
    area: Size,
    temperature: f32,
}

/// Force-directed layout engine.
///
/// Node positions are read and written in place. The engine ignores the
/// nodes' locked flag.
#[derive(Debug)]
pub struct Engine {
    config: ForceConfig,
    dimensions: Option<Size>,
    simulation: Option<Simulation>,
    rng: StdRng,
}

impl Engine {
    /// Create a new force layout engine
    pub fn new(config: ForceConfig) -> Self {
        let rng = Self::seeded(&config);
        Self {
            config,
            dimensions: None,
            simulation: None,
            rng,
        }
    }

    fn seeded(config: &ForceConfig) -> StdRng {
        match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Fix the working area instead of deriving it from the graph.
    pub fn set_dimensions(&mut self, width: f32, height: f32) -> &mut Self {
        self.dimensions = Some(Size::new(width, height));
        self
    }

    /// Set the maximum number of iterations per run
    pub fn set_iterations(&mut self, iterations: usize) -> &mut Self {
        self.config.iterations = iterations;
        self
    }

    /// Toggle the Barnes–Hut approximation.
    pub fn set_barnes_hut(&mut self, enabled: bool, theta: f32) -> &mut Self {
        self.config.barnes_hut = enabled;
        self.config.theta = theta;
        self
    }

    /// Current temperature, once the simulation has been initialized.
    pub fn temperature(&self) -> Option<f32> {
        self.simulation.map(|simulation| simulation.temperature)
    }

    /// Ideal edge length for `graph` in the engine's working area.
    pub fn ideal_distance(&self, graph: &Graph) -> f32 {
        let area = self.working_area(graph);
        Self::ideal_distance_in(area, graph.edge_count())
    }

    fn ideal_distance_in(area: Size, edge_count: usize) -> f32 {
        (area.width() * area.height() / edge_count.max(1) as f32).sqrt()
    }

    fn working_area(&self, graph: &Graph) -> Size {
        if let Some(dimensions) = self.dimensions {
            return dimensions;
        }
        let extent = graph
            .nodes()
            .map(|node| node.size().max_extent())
            .fold(MIN_NODE_EXTENT, f32::max);
        let side = extent * graph.node_count().max(1) as f32;
        Size::new(side, side)
    }

    fn params(&self, graph: &Graph, area: Size) -> ForceParams {
        let k = Self::ideal_distance_in(area, graph.edge_count());
        ForceParams {
            k,
            attraction_rate: self.config.attraction_rate,
            attraction_slack: self.config.attraction_percentage * k,
            repulsion_rate: self.config.repulsion_rate,
            repulsion_range: (self.config.repulsion_percentage
                * (area.width() + area.height()))
            .max(f32::EPSILON),
            theta: self.config.theta,
        }
    }

    /// Set up the temperature for a fresh run, optionally scattering nodes.
    fn prepare(&mut self, graph: &mut Graph, scatter: bool) -> Simulation {
        let area = self.working_area(graph);
        let simulation = Simulation {
            area,
            temperature: INITIAL_TEMPERATURE * area.max_extent(),
        };
        self.simulation = Some(simulation);

        if scatter {
            self.rng = Self::seeded(&self.config);
            for node in graph.nodes_mut() {
                let x = random_coordinate(&mut self.rng, area.width());
                let y = random_coordinate(&mut self.rng, area.height());
                node.set_position(Point::new(x, y));
            }
            graph.mark_modified();
        } else if Self::all_coincident(graph) {
            let count = graph.node_count() as f32;
            let radius = SPREAD_RADIUS * area.max_extent();
            for (idx, node) in graph.nodes_mut().enumerate() {
                let angle = TAU * idx as f32 / count;
                let offset = Point::new(angle.cos(), angle.sin()).scale(radius);
                node.set_position(node.position().add_point(offset));
            }
            graph.mark_modified();
        }

        simulation
    }

    fn all_coincident(graph: &Graph) -> bool {
        let mut positions = graph.nodes().map(|node| node.position());
        match positions.next() {
            Some(first) => graph.node_count() > 1 && positions.all(|p| p == first),
            None => false,
        }
    }

    /// One simulation step at the given temperature; returns the largest displacement.
    fn iterate(&self, graph: &mut Graph, params: &ForceParams, temperature: f32) -> f32 {
        let centers: Vec<Point> = graph.nodes().map(|node| node.position()).collect();
        let mut displacement = vec![Point::default(); centers.len()];

        if self.config.barnes_hut {
            let bodies: Vec<Body> = centers
                .iter()
                .enumerate()
                .map(|(index, &position)| Body { index, position })
                .collect();
            let tree = QuadTree::from_bodies(&bodies);
            for body in &bodies {
                displacement[body.index] = forces::barnes_hut_repulsion(&tree, *body, params);
            }
        } else {
            let bounds: Vec<Bounds> = graph.nodes().map(|node| node.bounds()).collect();
            forces::naive_repulsion(&centers, &bounds, params, &mut displacement);
        }

        for edge in graph.edges().filter(|edge| !edge.is_self_loop()) {
            let (Some(source), Some(target)) = (
                graph.node_index(edge.source()),
                graph.node_index(edge.target()),
            ) else {
                continue;
            };
            let pull = params.attraction(centers[source], centers[target]);
            displacement[source] = displacement[source].add_point(pull);
            displacement[target] = displacement[target].sub_point(pull);
        }

        let mut largest: f32 = 0.0;
        for (node, delta) in graph.nodes_mut().zip(displacement) {
            let delta = delta.clamp_length(temperature);
            if !delta.is_finite() {
                continue;
            }
            largest = largest.max(delta.hypot());
            node.set_position(node.position().add_point(delta));
        }
        largest
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ForceConfig::default())
    }
}

fn random_coordinate(rng: &mut StdRng, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.random_range(0.0..extent)
    } else {
        0.0
    }
}

impl LayoutEngine for Engine {
    fn init(&mut self, graph: &mut Graph) {
        let scatter = self.config.randomize;
        self.prepare(graph, scatter);
    }

    fn run(&mut self, graph: &mut Graph, shift: Point) -> Size {
        match graph.node_count() {
            0 => return Size::default(),
            1 => {
                let mut size = Size::default();
                for node in graph.nodes_mut() {
                    size = node.size();
                    node.set_position(shift.add_point(Point::new(
                        size.width() / 2.0,
                        size.height() / 2.0,
                    )));
                }
                graph.mark_modified();
                return size;
            }
            _ => {}
        }

        let mut simulation = self.prepare(graph, false);
        let params = self.params(graph, simulation.area);
        let threshold = self.config.convergence_epsilon * simulation.area.max_extent();
        debug!(
            nodes_count = graph.node_count(),
            edges_count = graph.edge_count(),
            ideal_distance = params.k,
            barnes_hut = self.config.barnes_hut;
            "Running force simulation"
        );

        let mut iterations = 0;
        while iterations < self.config.iterations {
            let largest = self.iterate(graph, &params, simulation.temperature);
            iterations += 1;
            trace!(iteration = iterations, temperature = simulation.temperature, largest; "Iteration");
            simulation.temperature *= COOLING;
            if simulation.temperature < threshold {
                break;
            }
        }
        self.simulation = Some(simulation);
        debug!(iterations; "Force simulation finished");

        let size = clusters::pack_clusters(graph, self.config.cluster_padding);
        for node in graph.nodes_mut() {
            node.set_position(node.position().add_point(shift));
        }
        graph.mark_modified();
        size
    }

    fn step(&mut self, graph: &mut Graph) -> bool {
        if graph.is_empty() {
            return false;
        }
        let simulation = match self.simulation {
            Some(simulation) => simulation,
            None => self.prepare(graph, false),
        };
        let params = self.params(graph, simulation.area);
        let largest = self.iterate(graph, &params, simulation.temperature);
        if largest > 0.0 {
            graph.mark_modified();
        }
        largest > self.config.movement_threshold
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use strata_core::{graph::Node, identifier::Id};

    use super::*;

    fn id(name: &str) -> Id {
        Id::new(name)
    }

    fn seeded_engine(seed: u64) -> Engine {
        Engine::new(ForceConfig {
            seed: Some(seed),
            ..ForceConfig::default()
        })
    }

    fn path(names: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for pair in names.windows(2) {
            graph.connect(id(pair[0]), id(pair[1]));
        }
        graph
    }

    #[test]
    fn test_empty_graph() {
        let mut graph = Graph::new();
        let mut engine = Engine::default();
        engine.init(&mut graph);
        assert!(engine.run(&mut graph, Point::default()).is_zero());
        assert!(!engine.step(&mut graph));
    }

    #[test]
    fn test_single_node_is_placed_at_shift() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(id("solo")).with_size(Size::new(20.0, 10.0)));
        let mut engine = Engine::default();

        let size = engine.run(&mut graph, Point::new(5.0, 5.0));

        let bounds = graph.node(id("solo")).unwrap().bounds();
        assert_eq!(size, Size::new(20.0, 10.0));
        assert_approx_eq!(f32, bounds.min_x(), 5.0);
        assert_approx_eq!(f32, bounds.min_y(), 5.0);
    }

    #[test]
    fn test_ideal_distance() {
        let graph = path(&["a", "b", "c"]);
        let mut engine = Engine::default();
        engine.set_dimensions(100.0, 200.0);
        assert_approx_eq!(f32, engine.ideal_distance(&graph), 100.0);
    }

    #[test]
    fn test_init_scatters_within_area() {
        let mut graph = path(&["a", "b", "c", "d"]);
        let mut engine = seeded_engine(7);
        engine.set_dimensions(50.0, 30.0);

        engine.init(&mut graph);

        for node in graph.nodes() {
            assert!((0.0..50.0).contains(&node.position().x()));
            assert!((0.0..30.0).contains(&node.position().y()));
        }
        assert_approx_eq!(f32, engine.temperature().unwrap(), 5.0);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut first = path(&["a", "b", "c", "d"]);
        let mut second = first.clone();

        let mut engine = seeded_engine(42);
        engine.init(&mut first);
        engine.run(&mut first, Point::default());
        let mut engine = seeded_engine(42);
        engine.init(&mut second);
        engine.run(&mut second, Point::default());

        for (a, b) in first.nodes().zip(second.nodes()) {
            assert_eq!(a.position(), b.position());
        }
    }

    #[test]
    fn test_init_without_randomize_spreads_coincident_nodes() {
        let mut graph = path(&["a", "b", "c"]);
        let mut engine = Engine::new(ForceConfig {
            randomize: false,
            ..ForceConfig::default()
        });

        engine.init(&mut graph);

        let positions: Vec<Point> = graph.nodes().map(|node| node.position()).collect();
        assert_ne!(positions[0], positions[1]);
        assert_ne!(positions[1], positions[2]);
        assert_ne!(positions[0], positions[2]);
    }

    #[test]
    fn test_step_moves_nodes_apart() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(id("a")).with_position(Point::new(0.0, 0.0)));
        graph.add_node(Node::new(id("b")).with_position(Point::new(1.0, 0.0)));
        let generation = graph.generation();
        let mut engine = Engine::default();

        assert!(engine.step(&mut graph));

        let a = graph.node(id("a")).unwrap().position();
        let b = graph.node(id("b")).unwrap().position();
        assert!(b.x() - a.x() > 1.0);
        assert!(graph.generation() > generation);
    }

    #[test]
    fn test_run_reports_layout_size() {
        let mut graph = path(&["a", "b", "c"]);
        for node in graph.nodes_mut() {
            node.set_size(Size::new(10.0, 6.0));
        }
        let mut engine = seeded_engine(3);
        engine.init(&mut graph);

        let size = engine.run(&mut graph, Point::new(100.0, 50.0));

        let bounds = graph.bounds().unwrap();
        assert_approx_eq!(f32, bounds.min_x(), 100.0, epsilon = 1e-3);
        assert_approx_eq!(f32, bounds.min_y(), 50.0, epsilon = 1e-3);
        assert_approx_eq!(f32, bounds.width(), size.width(), epsilon = 1e-3);
        assert_approx_eq!(f32, bounds.height(), size.height(), epsilon = 1e-3);
    }

    #[test]
    fn test_barnes_hut_handles_partly_coincident_nodes() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(id("a")).with_position(Point::new(2.32, 4.56)));
        graph.add_node(Node::new(id("b")).with_position(Point::new(2.32, 4.56)));
        graph.add_node(Node::new(id("c")).with_position(Point::new(40.7, -3.1)));
        graph.connect(id("a"), id("c"));
        let mut engine = Engine::new(ForceConfig {
            randomize: false,
            barnes_hut: true,
            ..ForceConfig::default()
        });

        engine.init(&mut graph);
        assert!(engine.step(&mut graph));
        let a = graph.node(id("a")).unwrap().position();
        let b = graph.node(id("b")).unwrap().position();
        assert_ne!(a, b);

        engine.run(&mut graph, Point::default());
        assert!(graph.nodes().all(|node| node.position().is_finite()));
    }

    #[test]
    fn test_barnes_hut_spreads_fully_coincident_nodes() {
        let mut graph = path(&["a", "b", "c", "d"]);
        for node in graph.nodes_mut() {
            node.set_position(Point::new(0.7, 1.3));
        }
        let mut engine = Engine::new(ForceConfig {
            randomize: false,
            barnes_hut: true,
            seed: Some(5),
            ..ForceConfig::default()
        });

        engine.init(&mut graph);
        let size = engine.run(&mut graph, Point::default());

        assert!(size.width() > 0.0 || size.height() > 0.0);
        assert!(graph.nodes().all(|node| node.position().is_finite()));
    }

    #[test]
    fn test_self_loops_are_ignored() {
        let mut graph = path(&["a", "b"]);
        graph.connect(id("a"), id("a"));
        let mut engine = seeded_engine(11);
        engine.init(&mut graph);

        engine.run(&mut graph, Point::default());

        assert!(graph.nodes().all(|node| node.position().is_finite()));
    }
}
