use std::sync::OnceLock;

use minigraph::{
    CachePolicy, CompileOptions, Context, Engine, EngineConfig, FanOut, HostGraph, Pattern, Plan,
    RankLayout, Vid,
};
use proptest::prelude::*;

/// Embeddings of `pattern` in `graph`, by trying every injective assignment.
fn brute_force(graph: &HostGraph, pattern: &Pattern, options: &CompileOptions) -> u64 {
    fn extend(
        graph: &HostGraph,
        pattern: &Pattern,
        options: &CompileOptions,
        bound: &mut Vec<Vid>,
    ) -> u64 {
        let k = bound.len();
        if k == pattern.size() {
            let ok = options
                .restrictions
                .iter()
                .all(|&(a, b)| bound[a] > bound[b]);
            return u64::from(ok);
        }
        let mut total = 0;
        for v in graph.vertices() {
            if bound.contains(&v) {
                continue;
            }
            let fits = (0..k).all(|j| {
                let edge = graph.has_edge(bound[j], v);
                if pattern.has_edge(j, k) {
                    edge
                } else {
                    !(options.induced && edge)
                }
            });
            if fits {
                bound.push(v);
                total += extend(graph, pattern, options, bound);
                bound.pop();
            }
        }
        total
    }
    extend(graph, pattern, options, &mut Vec::new())
}

fn complete(n: u32) -> HostGraph {
    let edges: Vec<_> = (0..n)
        .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
        .collect();
    HostGraph::from_edges(n as usize, &edges)
}

fn engine(cache: CachePolicy, fan_out: FanOut) -> Engine {
    Engine::new(
        EngineConfig::default()
            .with_threads(3)
            .with_cache(cache)
            .with_fan_out(fan_out)
            .with_chunk_size(2),
    )
    .unwrap()
}

/// Engines covering every cache and fan-out policy, built once per test binary.
fn engines() -> &'static [Engine] {
    static ENGINES: OnceLock<Vec<Engine>> = OnceLock::new();
    ENGINES.get_or_init(|| {
        let mut all = Vec::new();
        for cache in [CachePolicy::CostModel, CachePolicy::Always, CachePolicy::Never] {
            for fan_out in [FanOut::Always, FanOut::Never, FanOut::Adaptive { factor: 1 }] {
                all.push(engine(cache, fan_out));
            }
        }
        all
    })
}

fn patterns() -> Vec<(&'static str, Pattern, CompileOptions)> {
    let paw = Pattern::from_edges(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]).unwrap();
    let diamond = Pattern::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3)]).unwrap();
    vec![
        ("triangle", Pattern::clique(3).unwrap(), CompileOptions::default().descending(3)),
        ("triangle_unrestricted", Pattern::clique(3).unwrap(), CompileOptions::default()),
        ("clique4", Pattern::clique(4).unwrap(), CompileOptions::default().descending(4)),
        ("path3", Pattern::path(3).unwrap(), CompileOptions::default().restrict(0, 2)),
        ("path3_induced", Pattern::path(3).unwrap(), CompileOptions::default().induced(true)),
        ("cycle4", Pattern::cycle(4).unwrap(), CompileOptions::default()),
        (
            "cycle4_induced",
            Pattern::cycle(4).unwrap(),
            CompileOptions::default().induced(true).restrict(0, 2),
        ),
        ("paw", paw, CompileOptions::default().restrict(0, 1)),
        ("diamond_induced", diamond, CompileOptions::default().induced(true)),
        ("path4_no_cache", Pattern::path(4).unwrap(), CompileOptions::default().with_cache(false)),
    ]
}

#[test]
fn test_triangles_in_complete_graphs() {
    let plan = Plan::compile(
        &Pattern::clique(3).unwrap(),
        &CompileOptions::default().descending(3),
    )
    .unwrap();
    for n in 3..=9u32 {
        let expected = u64::from(n * (n - 1) * (n - 2) / 6);
        for engine in engines() {
            assert_eq!(engine.count(&complete(n), &plan), expected, "K{n}");
        }
    }
}

#[test]
fn test_k4_has_four_triangles() {
    let plan = Plan::compile(
        &Pattern::from_adjacency_str("011101110").unwrap(),
        &CompileOptions::default().descending(3),
    )
    .unwrap();
    let engine = &engines()[0];
    let mut ctx = engine.context();
    engine.run(&complete(4), &plan, &mut ctx);
    assert_eq!(ctx.total(), 4);
}

#[test]
fn test_edgeless_graph_has_no_embeddings() {
    let graph = HostGraph::from_edges(50, &[]);
    for (name, pattern, options) in patterns() {
        let plan = Plan::compile(&pattern, &options).unwrap();
        for engine in engines() {
            assert_eq!(engine.count(&graph, &plan), 0, "{name}");
        }
    }
}

#[test]
fn test_empty_graph_has_no_embeddings() {
    let graph = HostGraph::from_edges(0, &[]);
    let plan = Plan::compile(&Pattern::clique(3).unwrap(), &CompileOptions::default()).unwrap();
    assert_eq!(engines()[0].count(&graph, &plan), 0);
}

#[test]
fn test_induced_and_edge_induced_differ_on_triangles() {
    // In K4 every 3-path closes into a triangle, so no induced 3-path exists.
    let graph = complete(4);
    let path = Pattern::path(3).unwrap();
    let edge_induced = Plan::compile(&path, &CompileOptions::default()).unwrap();
    let induced = Plan::compile(&path, &CompileOptions::default().induced(true)).unwrap();
    let engine = &engines()[0];
    assert_eq!(engine.count(&graph, &edge_induced), 24);
    assert_eq!(engine.count(&graph, &induced), 0);
}

#[test]
fn test_wheel_graph_matches_brute_force() {
    // Hub 0 joined to a 6-cycle.
    let mut edges: Vec<(Vid, Vid)> = (1..=6).map(|v| (0, v)).collect();
    edges.extend((1..=6).map(|v| (v, v % 6 + 1)));
    let graph = HostGraph::from_edges(7, &edges);
    for (name, pattern, options) in patterns() {
        let plan = Plan::compile(&pattern, &options).unwrap();
        let expected = brute_force(&graph, &pattern, &options);
        for engine in engines() {
            assert_eq!(engine.count(&graph, &plan), expected, "{name}\n{plan}");
        }
    }
}

#[test]
fn test_ranks_share_one_coordinator() {
    let graph = complete(12);
    let plan = Plan::compile(
        &Pattern::clique(4).unwrap(),
        &CompileOptions::default().descending(4),
    )
    .unwrap();
    let layout = RankLayout {
        ranks: 3,
        threads_per_rank: 2,
    };
    let ranks: Vec<Engine> = (0..layout.ranks)
        .map(|_| Engine::new(EngineConfig::default().with_threads(2).with_chunk_size(1)).unwrap())
        .collect();
    let coordinator = ranks[0].coordinator(&graph, layout);

    let handled: u64 = std::thread::scope(|s| {
        let workers: Vec<_> = ranks
            .iter()
            .enumerate()
            .map(|(rank, engine)| {
                let (graph, plan, coordinator) = (&graph, &plan, &coordinator);
                s.spawn(move || {
                    let mut ctx = Context::new(2);
                    engine.run_rank(graph, plan, &mut ctx, coordinator, rank);
                    ctx.handled_total()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });

    assert_eq!(coordinator.run_major(), 495);
    assert_eq!(handled, 12);
    assert!(coordinator.is_drained());
}

fn arb_graph(max_n: u32) -> impl Strategy<Value = HostGraph> {
    (1..=max_n).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 0..(n as usize * 3))
            .prop_map(move |edges| HostGraph::from_edges(n as usize, &edges))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_engine_matches_brute_force(graph in arb_graph(11), which in 0usize..10) {
        let (name, pattern, options) = patterns().swap_remove(which);
        let plan = Plan::compile(&pattern, &options).unwrap();
        let expected = brute_force(&graph, &pattern, &options);
        for engine in engines() {
            prop_assert_eq!(engine.count(&graph, &plan), expected, "{}", name);
        }
    }
}
