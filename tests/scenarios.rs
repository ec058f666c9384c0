//! Cross-module scenarios that exercise the geometry kernel, graph
//! builder, spatial index, and matcher together rather than one module in
//! isolation.

use approx::assert_relative_eq;

use mapmatch_core::config::MatcherConfig;
use mapmatch_core::geo::{GeometryKind, Point, Polyline};
use mapmatch_core::graph::Graph;
use mapmatch_core::hmm::{EmissionModel, InitialModel, TransitionModel};
use mapmatch_core::matching::find_path;
use mapmatch_core::observation::Observation;

/// Three polylines sharing one coincident endpoint at
/// `(12.238140517, 45.658974159)` under a 50m geodetic merge tolerance must
/// fuse into a single central node with exactly three outgoing edges.
#[test]
fn test_six_edge_star_fuses_to_one_central_node() {
    let center = Point::geodetic(12.238140517, 45.658974159);
    let mut g = Graph::with_merge_epsilon(GeometryKind::GeodeticWgs84, 50.0);

    let arm = |bearing_deg: f64| -> Polyline {
        let tip = mapmatch_core::geo::geodesy::destination(&center, bearing_deg, 500.0).unwrap();
        Polyline::new(vec![center, tip])
    };

    g.add_approximate_direct_edge(arm(10.0)).unwrap();
    g.add_approximate_direct_edge(arm(130.0)).unwrap();
    g.add_approximate_direct_edge(arm(250.0)).unwrap();

    let central_nodes = g.get_nodes_near(&center);
    assert_eq!(central_nodes.len(), 1);
    let central = g.node(central_nodes[0]).unwrap();
    assert_eq!(central.out_edges.len(), 3);
}

/// Driven through the graph's own edge index rather than a bare
/// `HilbertRTree`: 100 unit-length edges laid end to end, queried by a
/// radius that should only catch a handful of them.
#[test]
fn test_edges_near_matches_expected_count() {
    let mut g = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.01);
    for i in 0..100 {
        let f = i as f64;
        g.add_approximate_direct_edge(Polyline::new(vec![Point::planar(f, 0.0), Point::planar(f + 1.0, 0.0)]))
            .unwrap();
    }
    g.freeze();

    let near = g.get_edges_near(&Point::planar(5.5, 0.0), 1.0).unwrap();
    assert!(near.len() >= 2 && near.len() <= 4);
}

/// A branching road graph with ten observations tracing one branch. The
/// matcher should recover exactly that branch in order.
#[test]
fn test_end_to_end_viterbi_follows_traversed_branch() {
    let mut g = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.5);
    let p = Point::planar;

    let stem = g
        .add_approximate_direct_edge(Polyline::new(vec![p(0.0, 0.0), p(10.0, 0.0)]))
        .unwrap();
    let branch = g
        .add_approximate_direct_edge(Polyline::new(vec![p(10.0, 0.0), p(20.0, 0.0)]))
        .unwrap();
    g.add_approximate_direct_edge(Polyline::new(vec![p(10.0, 0.0), p(20.0, 15.0)]))
        .unwrap();
    g.freeze();

    let observations: Vec<Option<Observation>> = (0..10)
        .map(|i| Some(Observation::new(i as f64 * 2.0, 0.1, i)))
        .collect();

    let config = MatcherConfig::new(
        50.0,
        false,
        InitialModel::Uniform,
        EmissionModel::Gaussian { sigma: 4.07 },
        TransitionModel::Topological,
    );

    let results = find_path(&mut g, &observations, &config).unwrap();
    assert!(!results.is_empty());
    let best = &results[0];
    assert_eq!(best.edges.first().copied(), Some(stem));
    assert!(best.edges.contains(&branch));
}

/// With off-road augmentation enabled, a single observation far outside
/// the candidate threshold should not strand the decode -- the matcher
/// should bridge it with synthetic edges and pick the real graph back up
/// afterward.
#[test]
fn test_off_road_excursion_rejoins_the_graph() {
    let mut g = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.5);
    let road = g
        .add_approximate_direct_edge(Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(100.0, 0.0)]))
        .unwrap();
    g.freeze();

    let observations = vec![
        Some(Observation::new(5.0, 1.0, 0)),
        Some(Observation::new(25.0, 120.0, 1)),
        Some(Observation::new(45.0, 1.0, 2)),
    ];

    let config = MatcherConfig::new(
        50.0,
        true,
        InitialModel::Uniform,
        EmissionModel::Gaussian { sigma: 10.0 },
        TransitionModel::Topological,
    );

    let results = find_path(&mut g, &observations, &config).unwrap();
    assert!(!results.is_empty());
    let best = &results[0];
    assert!(best.edges.contains(&road));
    // a synthetic edge id lives past the real graph's id range.
    assert!(best.edges.iter().any(|id| id.as_usize() > road.as_usize()));
}

/// WKT round trips and polyline reversal is involutive across the public
/// crate boundary.
#[test]
fn test_wkt_round_trip_and_reverse_involution() {
    use mapmatch_core::wkt_io::{format_linestring, parse_linestring};

    let pl = Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(3.0, 4.0), Point::planar(6.0, 0.0)]);
    let wkt = format_linestring(&pl);
    let parsed = parse_linestring(&wkt, GeometryKind::Euclidean).unwrap();
    assert_eq!(pl, parsed);
    assert_eq!(pl.reverse().reverse(), pl);
}

/// A* returns a path whose summed edge weight equals the g-score at the
/// destination, and it is the minimum available.
#[test]
fn test_astar_matches_brute_force_shortest_path() {
    use mapmatch_core::search;

    let mut g = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.01);
    let p = Point::planar;
    let short = g
        .add_approximate_direct_edges(Polyline::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]), false)
        .unwrap()
        .0;
    g.add_approximate_direct_edge(Polyline::new(vec![p(0.0, 0.0), p(0.0, 5.0)])).unwrap();
    g.add_approximate_direct_edge(Polyline::new(vec![p(0.0, 5.0), p(2.0, 0.0)])).unwrap();

    let start = g.edge(short).unwrap().from;
    let end = g.edge(short).unwrap().to;
    // after the fused near-line-merge build, `end` is the node near (2,0).
    let summary = search::run(&g, start, end, |e| e.path.length().unwrap(), |_, _| 0.0).unwrap();
    assert!(summary.found);
    let total: f64 = summary
        .edges
        .iter()
        .map(|&id| g.edge(id).unwrap().path.length().unwrap())
        .sum();
    assert_relative_eq!(total, 2.0, epsilon = 1e-9);
}
