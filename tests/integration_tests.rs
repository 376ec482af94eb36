use contraction_router::algo::builder::DirectedGraphBuilder;
use contraction_router::algo::contraction::{query::Server, ContractionConfig, HierarchyBuilder};
use contraction_router::algo::matrix::{DirectedWeightMatrix, PointErrorCode, ResolvedPoint};
use contraction_router::algo::{Error, PointSide};
use contraction_router::datastr::graph::*;
use contraction_router::io::{Deconstruct, Reconstruct};

// A ring of four vertices with edges of length 10 plus an isolated edge 4-5.
//
//       0 --e0-- 1
//       |        |
//      e3        e1        4 --e4-- 5
//       |        |
//       3 --e2-- 2
fn ring_with_island() -> BaseGraph {
    let edge = |from, to| BaseEdge {
        from,
        to,
        distance: 10.0,
        profile: 0,
    };
    BaseGraph::from_edges(6, &[edge(0, 1), edge(1, 2), edge(2, 3), edge(3, 0), edge(4, 5)]).unwrap()
}

fn contracted_ring() -> ContractedGraph {
    let base = ring_with_island();
    let graph = DirectedGraphBuilder::new(|_| Factor { value: 1.0, direction: 0 })
        .build(&base)
        .unwrap();
    HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap()
}

fn midpoint(edge: EdgeId, from: NodeId, to: NodeId) -> ResolvedPoint {
    ResolvedPoint {
        edge,
        from,
        to,
        weight: 10.0,
        offset: 0.5,
        direction: None,
    }
}

#[test]
fn point_to_point_around_the_ring() {
    let contracted = contracted_ring();
    let mut server = Server::new(&contracted);

    assert_eq!(server.distance(0, 2), 20.0);
    assert_eq!(server.path(0, 2).map(|p| p.len()), Some(3));
    assert_eq!(server.distance(1, 3), 20.0);
    assert_eq!(server.distance(0, 4), INFINITY);
    assert_eq!(server.path(0, 4), None);
}

#[test]
fn hierarchy_survives_persistence() {
    let contracted = contracted_ring();
    let dir = std::env::temp_dir().join("contraction_router_integration_ch");
    contracted.deconstruct_to(&dir).unwrap();
    let restored = ContractedGraph::reconstruct_from(&dir).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    let mut server = Server::new(&restored);
    assert_eq!(server.distance(0, 2), 20.0);
    assert_eq!(server.distance(3, 1), 20.0);
}

#[test]
fn matrix_over_the_ring() {
    let contracted = contracted_ring();
    let matrix = DirectedWeightMatrix::new(&contracted);

    let quarter = ResolvedPoint {
        offset: 0.25,
        ..midpoint(0, 0, 1)
    };
    let points = vec![
        midpoint(0, 0, 1),
        midpoint(1, 1, 2),
        midpoint(2, 2, 3),
        midpoint(3, 3, 0),
        quarter,
    ];

    let result = matrix.compute(&points, &points, INFINITY).unwrap();

    assert_eq!(result.weights.len(), 10);
    assert_eq!(result.weights[0].len(), 10);
    assert!(result.source_errors.is_empty());

    // a point to itself in the same direction costs nothing
    assert_eq!(result.weights[0][0], 0.0);
    // forward out of the middle of e0, forward into the middle of e1
    assert_eq!(result.weights[0][2], 10.0);
    // reaching a point behind on the same edge forward means a full loop
    // around the ring, turning on e0 itself is not allowed
    assert_eq!(result.weights[0][8], 37.5);
    // backward the same pair is a short hop along e0
    assert_eq!(result.weights[1][9], 2.5);
}

#[test]
fn unroutable_points_are_dropped_with_errors() {
    let contracted = contracted_ring();
    let matrix = DirectedWeightMatrix::new(&contracted);

    let island = midpoint(4, 4, 5);
    let points = vec![
        midpoint(0, 0, 1),
        midpoint(1, 1, 2),
        midpoint(2, 2, 3),
        midpoint(3, 3, 0),
        island,
    ];

    let result = matrix.compute(&points, &points, INFINITY).unwrap();

    assert_eq!(result.source_index, vec![0, 1, 2, 3]);
    assert_eq!(result.target_index, vec![0, 1, 2, 3]);
    assert_eq!(result.weights.len(), 8);
    assert!(result.weights.iter().all(|row| row.len() == 8));

    let error = &result.source_errors[&4];
    assert_eq!(error.code, PointErrorCode::NotRoutable);
    assert_eq!(result.target_errors.len(), 1);

    // the kept block is fully routable
    assert_eq!(result.weights[0][2], 10.0);
}

#[test]
fn unresolved_point_aborts_the_whole_request() {
    let contracted = contracted_ring();
    let matrix = DirectedWeightMatrix::new(&contracted);

    let unresolved = ResolvedPoint {
        edge: NO_EDGE,
        from: 0,
        to: 0,
        weight: 0.0,
        offset: 0.0,
        direction: None,
    };

    match matrix.compute(&[unresolved], &[midpoint(0, 0, 1)], INFINITY) {
        Err(Error::UnresolvablePoint {
            side: PointSide::Source,
            index: 0,
        }) => {}
        other => panic!("expected the request to abort, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn reporting_captures_a_full_run() {
    let _guard = contraction_router::report::enable_reporting("integration_tests");

    let contracted = contracted_ring();
    let matrix = DirectedWeightMatrix::new(&contracted);
    let result = matrix.compute(&[midpoint(0, 0, 1)], &[midpoint(1, 1, 2)], INFINITY).unwrap();
    assert_eq!(result.weights[0][0], 10.0);
}

#[test]
fn one_way_ring_only_loops_one_way() {
    let base = ring_with_island();
    // profile marks every edge forward only in canonical orientation
    let graph = DirectedGraphBuilder::new(|_| Factor { value: 1.0, direction: 1 })
        .build(&base)
        .unwrap();
    let contracted = HierarchyBuilder::new(graph, ContractionConfig::default()).run().unwrap();
    let mut server = Server::new(&contracted);

    assert_eq!(server.distance(0, 3), 30.0);
    assert_eq!(server.distance(3, 0), 10.0);
}
