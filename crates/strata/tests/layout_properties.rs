//! Behavioral properties of both layout engines on generated and small
//! hand-written graphs.

use std::{collections::HashMap, time::Instant};

use float_cmp::assert_approx_eq;
use petgraph::{algo::is_cyclic_directed, graph::DiGraph};
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

use strata::{
    Engine, ForceEngine, LayeredEngine,
    config::{ForceConfig, LayeredConfig},
    geometry::{Bounds, Point, Size},
    graph::{Edge, Graph, Node},
    identifier::Id,
};

const EPSILON: f32 = 1e-2;

fn id(name: &str) -> Id {
    Id::new(name)
}

fn node_id(idx: usize) -> Id {
    Id::new(&format!("n{idx}"))
}

fn build_graph(sizes: &[(f32, f32)], edges: &[(usize, usize)]) -> Graph {
    let mut graph = Graph::new();
    for (idx, &(width, height)) in sizes.iter().enumerate() {
        graph.add_node(Node::new(node_id(idx)).with_size(Size::new(width, height)));
    }
    for &(source, target) in edges {
        graph.connect(node_id(source), node_id(target));
    }
    graph
}

fn graph_strategy() -> impl Strategy<Value = Graph> {
    (1usize..10).prop_flat_map(|n| {
        (
            prop::collection::vec((0.0f32..40.0, 0.0f32..40.0), n),
            prop::collection::vec((0..n, 0..n), 0..(2 * n)),
        )
            .prop_map(|(sizes, edges)| build_graph(&sizes, &edges))
    })
}

fn force_engine(seed: u64) -> ForceEngine {
    ForceEngine::new(ForceConfig {
        seed: Some(seed),
        iterations: 200,
        ..ForceConfig::default()
    })
}

fn assert_within(graph: &Graph, shift: Point, size: Size) {
    let area = Bounds::new_from_top_left(shift, size).expand(EPSILON);
    for node in graph.nodes() {
        let bounds = node.bounds();
        assert!(
            area.contains(bounds.min_point())
                && area.contains(Point::new(bounds.max_x(), bounds.max_y())),
            "node {} at {:?} escapes {:?}",
            node.id(),
            bounds,
            area
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn force_layout_stays_within_reported_size(graph in graph_strategy(), seed in any::<u64>()) {
        let mut graph = graph;
        let shift = Point::new(7.0, -3.0);
        let mut engine = force_engine(seed);

        engine.init(&mut graph);
        let size = engine.run(&mut graph, shift);

        prop_assert!(graph.nodes().all(|node| node.position().is_finite()));
        assert_within(&graph, shift, size);
    }

    #[test]
    fn layered_layout_respects_layers(graph in graph_strategy()) {
        let mut graph = graph;
        let shift = Point::new(-20.0, 5.0);
        let mut engine = LayeredEngine::new(LayeredConfig::default());
        let endpoints_before: Vec<(Id, Id)> =
            graph.edges().map(|edge| (edge.source(), edge.target())).collect();

        engine.init(&mut graph);
        let size = engine.run(&mut graph, shift);
        assert_within(&graph, shift, size);

        let endpoints_after: Vec<(Id, Id)> =
            graph.edges().map(|edge| (edge.source(), edge.target())).collect();
        prop_assert_eq!(endpoints_before, endpoints_after);

        let report = engine.report().expect("run leaves a report");
        let mut oracle = DiGraph::<(), ()>::new();
        let indices: HashMap<Id, _> = graph.node_ids().map(|id| (id, oracle.add_node(()))).collect();

        for edge in graph.edges().filter(|edge| !edge.is_self_loop()) {
            let reversed = report.is_reversed(&edge.identity());
            let source = report.layer(edge.source()).unwrap();
            let target = report.layer(edge.target()).unwrap();
            if reversed {
                prop_assert!(target < source);
                oracle.add_edge(indices[&edge.target()], indices[&edge.source()], ());
            } else {
                prop_assert!(source < target);
                oracle.add_edge(indices[&edge.source()], indices[&edge.target()], ());
            }
        }
        prop_assert!(!is_cyclic_directed(&oracle));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn barnes_hut_accepts_coincident_positions(
        graph in graph_strategy(),
        anchors in prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 1..3),
    ) {
        let mut graph = graph;
        for (idx, node) in graph.nodes_mut().enumerate() {
            let (x, y) = anchors[idx % anchors.len()];
            node.set_position(Point::new(x, y));
        }
        let mut engine = ForceEngine::new(ForceConfig {
            randomize: false,
            barnes_hut: true,
            iterations: 50,
            ..ForceConfig::default()
        });

        engine.init(&mut graph);
        engine.step(&mut graph);
        let size = engine.run(&mut graph, Point::default());

        prop_assert!(graph.nodes().all(|node| node.position().is_finite()));
        assert_within(&graph, Point::default(), size);
    }
}

#[test]
fn test_layered_handles_mid_sized_graph() {
    let mut rng = StdRng::seed_from_u64(300);
    let edges: Vec<(usize, usize)> = (0..600)
        .map(|_| (rng.random_range(0..300), rng.random_range(0..300)))
        .collect();
    let mut graph = build_graph(&[(12.0, 8.0); 300], &edges);
    let edge_count = graph.edge_count();
    let mut engine = LayeredEngine::default();

    let started = Instant::now();
    let size = engine.run(&mut graph, Point::default());
    let elapsed = started.elapsed();

    assert!(elapsed.as_secs() < 30, "layered layout took {elapsed:?}");
    assert_within(&graph, Point::default(), size);
    assert_eq!(graph.edge_count(), edge_count);
    let report = engine.report().unwrap();
    for edge in graph.edges().filter(|edge| !edge.is_self_loop()) {
        let source = report.layer(edge.source()).unwrap();
        let target = report.layer(edge.target()).unwrap();
        let span = source.abs_diff(target);
        let bends = edge.bend_points().map_or(0, <[Point]>::len);
        assert_eq!(bends, span - 1, "edge {} -> {}", edge.source(), edge.target());
    }
}

#[test]
fn test_triangle_reverses_exactly_one_edge() {
    let mut graph = build_graph(&[(10.0, 10.0); 3], &[(0, 1), (1, 2), (2, 0)]);
    let mut engine = LayeredEngine::default();

    engine.run(&mut graph, Point::default());

    let report = engine.report().unwrap();
    assert_eq!(report.reversed_edges().len(), 1);
    assert_eq!(report.layer_count(), 3);
    // The caller's edges keep their direction.
    assert!(graph.has_edge(node_id(2), node_id(0)));
}

#[test]
fn test_barnes_hut_tracks_exact_repulsion() {
    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 3), (6, 7)];
    let mut exact = build_graph(&[(0.0, 0.0); 8], &edges);
    let mut approximate = exact.clone();

    let mut naive = force_engine(99);
    let mut barnes_hut = force_engine(99);
    barnes_hut.set_barnes_hut(true, 0.0);
    naive.init(&mut exact);
    barnes_hut.init(&mut approximate);

    for _ in 0..20 {
        naive.step(&mut exact);
        barnes_hut.step(&mut approximate);
    }

    let tolerance = 0.01 * naive.ideal_distance(&exact);
    for (a, b) in exact.nodes().zip(approximate.nodes()) {
        let distance = a.position().sub_point(b.position()).hypot();
        assert!(distance < tolerance, "{} drifted by {distance}", a.id());
    }
}

#[test]
fn test_path_settles_into_a_line() {
    let mut graph = Graph::new();
    graph.connect(id("a"), id("b"));
    graph.connect(id("b"), id("c"));
    let mut engine = ForceEngine::new(ForceConfig {
        seed: Some(2024),
        iterations: 50,
        ..ForceConfig::default()
    });

    engine.init(&mut graph);
    engine.run(&mut graph, Point::default());

    let k = engine.ideal_distance(&graph);
    let a = graph.node(id("a")).unwrap().position();
    let b = graph.node(id("b")).unwrap().position();
    let c = graph.node(id("c")).unwrap().position();

    for spacing in [a.sub_point(b).hypot(), b.sub_point(c).hypot()] {
        assert!(spacing > 0.5 * k && spacing < 2.0 * k, "spacing {spacing} vs k {k}");
    }
    let ac = c.sub_point(a);
    let ab = b.sub_point(a);
    let off_line = (ac.x() * ab.y() - ac.y() * ab.x()).abs() / ac.hypot();
    assert!(off_line < 0.15 * ac.hypot(), "b is {off_line} off the a-c line");
}

#[test]
fn test_rerun_without_randomize_is_stable() {
    let mut graph = build_graph(&[(0.0, 0.0); 4], &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let mut engine = ForceEngine::new(ForceConfig {
        seed: Some(17),
        ..ForceConfig::default()
    });
    engine.init(&mut graph);
    engine.run(&mut graph, Point::default());
    let settled: Vec<Point> = graph.nodes().map(|node| node.position()).collect();

    let threshold = engine.config().movement_threshold;
    let mut rerun = ForceEngine::new(ForceConfig {
        randomize: false,
        ..engine.config().clone()
    });
    rerun.init(&mut graph);
    rerun.run(&mut graph, Point::default());

    for (before, node) in settled.iter().zip(graph.nodes()) {
        let moved = node.position().sub_point(*before).hypot();
        assert!(moved < threshold, "{} moved by {moved}", node.id());
    }
}

#[test]
fn test_clusters_are_packed_with_padding() {
    let mut graph = Graph::new();
    for name in ["lonely", "a", "b", "hermit"] {
        graph.add_node(Node::new(id(name)).with_size(Size::new(10.0, 10.0)));
    }
    graph.add_edge(Edge::new(id("a"), id("b"))).unwrap();
    let mut engine = force_engine(8);

    engine.init(&mut graph);
    let size = engine.run(&mut graph, Point::default());

    let bounds_of = |names: &[&str]| {
        names
            .iter()
            .map(|name| graph.node(id(name)).unwrap().bounds())
            .reduce(|acc, bounds| acc.merge(&bounds))
            .unwrap()
    };
    let singles = bounds_of(&["lonely", "hermit"]);
    let pair = bounds_of(&["a", "b"]);
    let padding = engine.config().cluster_padding;

    assert_approx_eq!(f32, singles.min_x(), 0.0, epsilon = 1e-3);
    assert_approx_eq!(f32, singles.min_y(), 0.0, epsilon = 1e-3);
    assert_approx_eq!(f32, pair.min_y(), 0.0, epsilon = 1e-3);
    assert!(pair.min_x() >= singles.max_x() + padding - 1e-3);
    assert_approx_eq!(f32, size.width(), pair.max_x(), epsilon = 1e-3);
}
