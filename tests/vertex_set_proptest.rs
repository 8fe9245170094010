use minigraph::{VertexSet, Vid};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn sorted_set(max: Vid, len: usize) -> impl Strategy<Value = Vec<Vid>> {
    proptest::collection::btree_set(0..max, 0..len).prop_map(|s| s.into_iter().collect())
}

/// Small dense sets and one large sparse side, so both the merge and the galloping
/// kernels are exercised.
fn operands() -> impl Strategy<Value = (Vec<Vid>, Vec<Vid>)> {
    prop_oneof![
        (sorted_set(64, 40), sorted_set(64, 40)),
        (sorted_set(5000, 4), sorted_set(5000, 2000)),
        (sorted_set(5000, 2000), sorted_set(5000, 4)),
    ]
}

proptest! {
    #[test]
    fn test_set_ops_match_std((a, b) in operands(), except in 0..64u32, bound in 0..5000u32) {
        let sa: BTreeSet<Vid> = a.iter().copied().collect();
        let sb: BTreeSet<Vid> = b.iter().copied().collect();
        let va = VertexSet::new(&a);
        let vb = VertexSet::new(&b);
        let mut out = Vec::new();

        let inter: Vec<Vid> = sa.intersection(&sb).copied().collect();
        va.intersect_into(vb, &mut out);
        prop_assert_eq!(&out, &inter);
        prop_assert_eq!(va.intersect_cnt(vb), inter.len());

        let diff: Vec<Vid> = sa.difference(&sb).copied().collect();
        va.subtract_into(vb, &mut out);
        prop_assert_eq!(&out, &diff);
        prop_assert_eq!(va.subtract_cnt(vb), diff.len());

        let inter_ex: Vec<Vid> = inter.iter().copied().filter(|&x| x != except).collect();
        va.intersect_except_into(vb, except, &mut out);
        prop_assert_eq!(&out, &inter_ex);
        prop_assert_eq!(va.intersect_except_cnt(vb, except), inter_ex.len());

        let diff_ex: Vec<Vid> = diff.iter().copied().filter(|&x| x != except).collect();
        va.subtract_except_into(vb, except, &mut out);
        prop_assert_eq!(&out, &diff_ex);
        prop_assert_eq!(va.subtract_except_cnt(vb, except), diff_ex.len());

        let below: Vec<Vid> = sa.range(..bound).copied().collect();
        prop_assert_eq!(va.bounded(bound).as_slice(), below.as_slice());
        let above: Vec<Vid> = sa.range((bound + 1)..).copied().collect();
        prop_assert_eq!(va.bounded_below(bound).as_slice(), above.as_slice());
    }

    #[test]
    fn test_self_operations(a in sorted_set(200, 100)) {
        let va = VertexSet::new(&a);
        let mut out = Vec::new();
        va.intersect_into(va, &mut out);
        prop_assert_eq!(&out, &a);
        prop_assert_eq!(va.subtract_cnt(va), 0);
        prop_assert_eq!(va.intersect_cnt(VertexSet::EMPTY), 0);
        prop_assert_eq!(va.subtract_cnt(VertexSet::EMPTY), a.len());
        for (i, v) in va.iter().enumerate() {
            prop_assert_eq!(va.position(v), Some(i));
        }
    }
}
