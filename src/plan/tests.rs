use super::*;

fn triangle_levels() -> Vec<Level> {
    vec![
        Level::new(SetExpr::from_base(SetRef::All)),
        Level::new(SetExpr::from_base(SetRef::Adj(0)).below(0)),
        Level::new(
            SetExpr::from_base(SetRef::Candidates(1))
                .intersect(SetRef::Adj(1))
                .below(1),
        ),
    ]
}

fn four_clique_levels() -> Vec<Level> {
    vec![
        Level::new(SetExpr::from_base(SetRef::All)),
        Level::cached(SetExpr::from_base(SetRef::Adj(0)).below(0), None),
        Level::new(
            SetExpr::from_base(SetRef::Candidates(1))
                .intersect(SetRef::Cached { cache: 1, pos: 1 })
                .below(1),
        ),
        Level::new(
            SetExpr::from_base(SetRef::Candidates(2))
                .intersect(SetRef::Cached { cache: 1, pos: 2 })
                .below(2),
        ),
    ]
}

#[test]
fn test_plan_accepts_triangle() {
    let plan = Plan::new(triangle_levels()).unwrap();
    assert_eq!(plan.depth(), 3);
    assert_eq!(plan.cache_count(), 0);
}

#[test]
fn test_plan_rejects_empty() {
    assert!(Plan::new(Vec::new()).is_err());
}

#[test]
fn test_plan_rejects_constrained_root() {
    let mut levels = triangle_levels();
    levels[0].candidates = SetExpr::from_base(SetRef::All).below(0);
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_forward_references() {
    let mut levels = triangle_levels();
    levels[1].candidates = SetExpr::from_base(SetRef::Adj(1));
    assert!(Plan::new(levels).is_err());

    let mut levels = triangle_levels();
    levels[1].candidates = SetExpr::from_base(SetRef::Adj(0)).below(2);
    assert!(Plan::new(levels).is_err());

    let mut levels = triangle_levels();
    levels[2].candidates = SetExpr::from_base(SetRef::Candidates(2));
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_all_outside_root() {
    let mut levels = triangle_levels();
    levels[2].candidates = SetExpr::from_base(SetRef::All);
    assert!(Plan::new(levels).is_err());

    let mut levels = triangle_levels();
    levels[2].candidates = SetExpr::from_base(SetRef::Adj(0)).intersect(SetRef::All);
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_cache_on_last_level() {
    let mut levels = triangle_levels();
    levels[2].cache = Some(CacheSpec::default());
    let err = Plan::new(levels).unwrap_err();
    assert!(format!("{err:#}").contains("last level"));
}

#[test]
fn test_plan_rejects_cached_lookup_without_cache() {
    let mut levels = four_clique_levels();
    levels[1].cache = None;
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_cached_lookup_outside_cache_chain() {
    // Level 2 draws from N(v0), not from level 1's candidates.
    let mut levels = four_clique_levels();
    levels[2].candidates = SetExpr::from_base(SetRef::Adj(0))
        .intersect(SetRef::Adj(1))
        .below(1);
    levels[3].candidates = SetExpr::from_base(SetRef::Candidates(2))
        .intersect(SetRef::Cached { cache: 1, pos: 2 });
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_cached_base() {
    let mut levels = four_clique_levels();
    levels[3].candidates = SetExpr::from_base(SetRef::Cached { cache: 1, pos: 2 });
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_rejects_bad_cache_parent() {
    let mut levels = four_clique_levels();
    levels[2].cache = Some(CacheSpec { parent: Some(2) });
    assert!(Plan::new(levels).is_err());
}

#[test]
fn test_plan_analysis_tracks_lookups_and_distances() {
    let plan = Plan::new(four_clique_levels()).unwrap();
    assert_eq!(plan.cache_count(), 1);
    assert!(plan.info(1).lookups.is_empty());
    assert_eq!(plan.info(2).lookups, vec![1]);
    assert_eq!(plan.info(1).cache_distances, vec![1, 2]);
    assert!(plan.info(3).lookups.is_empty());
}

#[test]
fn test_plan_json_round_trip() {
    let plan = Plan::new(four_clique_levels()).unwrap();
    let json = plan.to_json_string().unwrap();
    let back = Plan::from_json_str(&json).unwrap();
    assert_eq!(back, plan);
    assert_eq!(back.info(2).lookups, vec![1]);
}

#[test]
fn test_plan_json_is_validated() {
    let json = r#"[
        { "candidates": { "base": "all" } },
        { "candidates": { "base": { "adj": 3 } } }
    ]"#;
    assert!(Plan::from_json_str(json).is_err());

    let json = r#"[
        { "candidates": { "base": "all" } },
        { "candidates": { "base": { "adj": 0 }, "upper": [0] } }
    ]"#;
    let plan = Plan::from_json_str(json).unwrap();
    assert_eq!(plan.depth(), 2);
}

#[test]
fn test_plan_display_is_readable() {
    let text = Plan::new(four_clique_levels()).unwrap().to_string();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "C0 = V");
    assert_eq!(lines[1], "C1 = N(v0) <v0 [cache]");
    assert_eq!(lines[3], "C3 = C2 & M1(v2) <v2");
}

#[test]
fn test_plan_compile_matches_hand_written_clique() {
    let compiled = Plan::compile(
        &Pattern::clique(4).unwrap(),
        &CompileOptions::default().descending(4),
    )
    .unwrap();
    assert_eq!(compiled, Plan::new(four_clique_levels()).unwrap());
}

#[test]
fn test_plan_compile_derives_nested_caches() {
    let plan = Plan::compile(
        &Pattern::clique(5).unwrap(),
        &CompileOptions::default().descending(5),
    )
    .unwrap();
    // Every deeper lookup lands in the outermost cache.
    assert_eq!(plan.cache_count(), 1);
    assert_eq!(plan.info(1).cache_distances, vec![1, 2, 3]);
}
