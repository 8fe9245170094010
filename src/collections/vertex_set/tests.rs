//! Tests for the vertex-set algebra.

use super::*;

fn set(ids: &[Vid]) -> VertexSet<'_> {
    VertexSet::new(ids)
}

#[test]
fn test_bounded_is_strict_prefix() {
    let ids = [1, 4, 6, 9];
    let s = set(&ids);
    assert_eq!(s.bounded(6).as_slice(), &[1, 4]);
    assert_eq!(s.bounded(7).as_slice(), &[1, 4, 6]);
    assert!(s.bounded(1).is_empty());
    assert_eq!(s.bounded(100).len(), 4);
}

#[test]
fn test_bounded_below_is_strict_suffix() {
    let ids = [1, 4, 6, 9];
    let s = set(&ids);
    assert_eq!(s.bounded_below(4).as_slice(), &[6, 9]);
    assert_eq!(s.bounded_below(0).len(), 4);
    assert!(s.bounded_below(9).is_empty());
}

#[test]
fn test_intersect_and_count() {
    let a = [1, 2, 3, 5, 8, 13];
    let b = [2, 3, 4, 5, 6, 13, 21];
    let mut out = Vec::new();
    set(&a).intersect_into(set(&b), &mut out);
    assert_eq!(out, vec![2, 3, 5, 13]);
    assert_eq!(set(&a).intersect_cnt(set(&b)), 4);

    set(&a).intersect_except_into(set(&b), 5, &mut out);
    assert_eq!(out, vec![2, 3, 13]);
    assert_eq!(set(&a).intersect_except_cnt(set(&b), 5), 3);
    // Excluding an ID that is not in the result is a no-op.
    assert_eq!(set(&a).intersect_except_cnt(set(&b), 8), 4);
}

#[test]
fn test_subtract_and_count() {
    let a = [1, 2, 3, 5, 8, 13];
    let b = [2, 3, 4, 5, 6, 13, 21];
    let mut out = Vec::new();
    set(&a).subtract_into(set(&b), &mut out);
    assert_eq!(out, vec![1, 8]);
    assert_eq!(set(&a).subtract_cnt(set(&b)), 2);

    set(&a).subtract_except_into(set(&b), 8, &mut out);
    assert_eq!(out, vec![1]);
    assert_eq!(set(&a).subtract_except_cnt(set(&b), 8), 1);
    // An excluded ID removed by the subtraction itself is not double-counted.
    assert_eq!(set(&a).subtract_except_cnt(set(&b), 2), 2);
}

#[test]
fn test_empty_operands() {
    let a = [1, 2, 3];
    let mut out = vec![99];
    set(&a).intersect_into(VertexSet::EMPTY, &mut out);
    assert!(out.is_empty());
    assert_eq!(VertexSet::EMPTY.intersect_cnt(set(&a)), 0);
    assert_eq!(set(&a).subtract_cnt(VertexSet::EMPTY), 3);
    assert_eq!(set(&a).subtract_except_cnt(VertexSet::EMPTY, 2), 2);
    assert_eq!(VertexSet::EMPTY.subtract_cnt(set(&a)), 0);
}

#[test]
fn test_fully_overlapping() {
    let a = [3, 7, 11];
    assert_eq!(set(&a).intersect_cnt(set(&a)), 3);
    assert_eq!(set(&a).subtract_cnt(set(&a)), 0);
}

#[test]
fn test_position_and_contains() {
    let a = [3, 7, 11];
    let s = set(&a);
    assert_eq!(s.position(7), Some(1));
    assert_eq!(s.position(8), None);
    assert!(s.contains(11));
    assert_eq!(s[2], 11);
    assert_eq!(s.iter().collect::<Vec<_>>(), vec![3, 7, 11]);
}
