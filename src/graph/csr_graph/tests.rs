//! Tests for the host CSR graph.

use super::*;

#[test]
fn test_from_adjacency_basic() {
    // 0 - 1 - 2, 0 - 2
    let adjacency = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
    let graph = HostGraph::from_adjacency(&adjacency);

    assert_eq!(graph.vertex_count(), 3);
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(graph.max_degree(), 2);
    assert_eq!(graph.neighbors(1).as_slice(), &[0, 2]);
    assert!(graph.has_edge(2, 0));
}

#[test]
fn test_from_edges_symmetrizes_and_dedups() {
    let graph = HostGraph::from_edges(4, &[(0, 1), (1, 0), (2, 1), (3, 3), (0, 3)]);

    assert_eq!(graph.neighbors(0).as_slice(), &[1, 3]);
    assert_eq!(graph.neighbors(1).as_slice(), &[0, 2]);
    assert_eq!(graph.neighbors(2).as_slice(), &[1]);
    // Self-loop dropped.
    assert_eq!(graph.neighbors(3).as_slice(), &[0]);
    assert_eq!(graph.edge_count(), 6);
    assert_eq!(graph.degree(1), 2);
}

#[test]
fn test_average_degree() {
    let graph = HostGraph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    assert!((graph.average_degree() - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_empty_graph() {
    let adjacency: Vec<Vec<Vid>> = vec![];
    let graph = HostGraph::from_adjacency(&adjacency);
    assert_eq!(graph.vertex_count(), 0);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.max_degree(), 0);
    assert!(graph.average_degree().abs() < f64::EPSILON);
    assert_eq!(graph.vertices().count(), 0);
}

#[test]
fn test_disconnected_graph() {
    let graph = HostGraph::from_adjacency(&vec![vec![]; 5]);
    for v in graph.vertices() {
        assert_eq!(graph.degree(v), 0);
        assert!(graph.neighbors(v).is_empty());
    }
}

#[test]
#[should_panic(expected = "not sorted-unique")]
fn test_unsorted_row_rejected() {
    let _ = HostGraph::from_adjacency(&[vec![2, 1], vec![0], vec![0]]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_out_of_bounds_edge_rejected() {
    let _ = HostGraph::from_edges(2, &[(0, 5)]);
}
