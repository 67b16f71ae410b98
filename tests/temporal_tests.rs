//! Integration tests for temporal network analysis.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tempnet::prelude::*;

fn scenario() -> Vec<(&'static str, &'static str, Timestamp)> {
    vec![("A", "B", 1), ("B", "C", 2), ("A", "B", 3), ("B", "D", 4)]
}

/// Edge weights keyed by endpoint names, independent of vertex order.
fn weights(g: &AggregateGraph) -> BTreeMap<(String, String), f64> {
    g.edges()
        .map(|(a, b, w)| ((a.to_string(), b.to_string()), w))
        .collect()
}

#[test]
fn test_scenario_two_paths() {
    let mut tn = TemporalNetwork::from_edges(scenario());

    assert_eq!(tn.two_path_count(), 2);
    let paths = tn.two_paths().paths().to_vec();
    assert_eq!(paths[0], TwoPath::new("A", "B", "C", 1.0));
    assert_eq!(paths[1], TwoPath::new("A", "B", "D", 1.0));
}

#[test]
fn test_scenario_first_order() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    let g1 = tn.first_order_graph();

    assert_eq!(g1.vertex_names(), vec!["A", "B", "C", "D"]);
    assert_eq!(g1.edge_weight("A", "B").unwrap(), Some(2.0));
    assert_eq!(g1.edge_weight("B", "C").unwrap(), Some(1.0));
    assert_eq!(g1.edge_weight("B", "D").unwrap(), Some(1.0));
    assert_eq!(g1.edge_count(), 3);
}

#[test]
fn test_scenario_delta_two() {
    // (A,B,1): B departs inside (1,3] only at t=2 -> A,B,C.
    // (B,C,2): C never departs.
    // (A,B,3): B departs inside (3,5] only at t=4 -> A,B,D.
    // (B,D,4): D never departs.
    let config = NetworkConfig::default().with_max_time_diff(2);
    let mut tn = TemporalNetwork::from_edges_with_config(scenario(), config).unwrap();

    assert_eq!(tn.two_path_count(), 2);
    let g2 = tn.second_order_graph();
    assert_eq!(g2.edge_weight("A,B", "B,C").unwrap(), Some(1.0));
    assert_eq!(g2.edge_weight("A,B", "B,D").unwrap(), Some(1.0));
}

#[test]
fn test_weight_conservation_per_incoming_edge() {
    // Every arrival is alone at its node and timestamp; departures happen at
    // a single later timestamp.
    let mut tn = TemporalNetwork::from_edges([
        ("a", "v", 1),
        ("v", "x", 2),
        ("v", "y", 2),
        ("v", "z", 2),
        ("b", "w", 5),
        ("w", "q", 6),
    ]);

    let tps = tn.two_paths();
    let mut by_source: BTreeMap<&str, f64> = BTreeMap::new();
    for tp in tps.paths() {
        *by_source.entry(tp.source.as_str()).or_insert(0.0) += tp.weight;
    }
    assert_eq!(by_source.len(), 2);
    for (source, total) in by_source {
        assert!((total - 1.0).abs() < 1e-12, "{source} carries {total}");
    }
}

#[test]
fn test_determinism_under_reordering() {
    let edges = vec![
        ("a", "b", 1),
        ("c", "b", 1),
        ("b", "d", 2),
        ("b", "e", 2),
        ("b", "a", 3),
        ("d", "a", 3),
        ("a", "c", 4),
        ("e", "c", 4),
        ("c", "b", 5),
    ];
    let mut reversed = edges.clone();
    reversed.reverse();
    let mut rotated = edges.clone();
    rotated.rotate_left(4);

    let mut reference = TemporalNetwork::from_edges(edges);
    let first = weights(reference.first_order_graph());
    let second = weights(reference.second_order_graph());

    for order in [reversed, rotated] {
        let mut tn = TemporalNetwork::from_edges(order);
        assert_eq!(weights(tn.first_order_graph()), first);
        assert_eq!(weights(tn.second_order_graph()), second);
    }
}

#[test]
fn test_cache_invalidation() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    assert_eq!(tn.second_order_graph().edge_count(), 2);

    tn.add_edge("D", "A", 5);
    let g2 = tn.second_order_graph();
    assert_eq!(g2.edge_weight("B,D", "D,A").unwrap(), Some(1.0));

    // Widening the window joins (A,B,1) with (B,D,4) as well.
    tn.set_max_time_diff(3).unwrap();
    assert_eq!(tn.max_time_diff(), 3);
    let g2 = tn.second_order_graph();
    assert!(g2.edge_weight("A,B", "B,D").unwrap().unwrap() > 1.0);
}

#[test]
fn test_k_order_graphs() {
    let mut tn = TemporalNetwork::from_edges([("a", "b", 1), ("b", "c", 2), ("c", "d", 3), ("c", "e", 3)]);

    let g3 = tn.k_order_graph(3, 1).unwrap();
    assert_eq!(g3.order(), 3);
    assert_eq!(g3.edge_weight("a,b,c", "b,c,d").unwrap(), Some(0.5));
    assert_eq!(g3.edge_weight("a,b,c", "b,c,e").unwrap(), Some(0.5));

    assert!(matches!(
        tn.k_order_graph(0, 1),
        Err(Error::InvalidParameter { name: "order", .. })
    ));
}

#[test]
fn test_null_model_row_stochastic() {
    // Repeated tour a -> b -> c -> a with detours through d.
    let walk = ["a", "b", "c", "a", "d", "b", "c", "a", "b", "d", "a", "b", "c", "a"];
    let edges: Vec<(&str, &str, Timestamp)> = walk
        .windows(2)
        .enumerate()
        .map(|(t, w)| (w[0], w[1], t as Timestamp))
        .collect();
    let mut tn = TemporalNetwork::from_edges(edges);

    let giant_names: Vec<String> = tn
        .second_order_graph()
        .giant_component()
        .vertex_names()
        .into_iter()
        .map(String::from)
        .collect();

    let null = tn.second_order_null_graph().unwrap();
    assert_eq!(null.vertex_names(), giant_names);
    for row in null.transition_matrix().rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }

    let pi = tn.stationary_distribution().unwrap();
    let total: f64 = pi.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(pi.iter().all(|&(_, p)| p > 0.0));
}

#[test]
fn test_null_model_on_long_ring() {
    // A 250-node ring walk with one shortcut 0 -> 1 -> 5 -> 6 mixes slowly.
    let n = 250usize;
    let mut paths: Vec<TwoPath> = (0..n)
        .map(|i| TwoPath::new(i, (i + 1) % n, (i + 2) % n, 1.0))
        .collect();
    paths.push(TwoPath::new(0usize, 1usize, 5usize, 1.0));
    paths.push(TwoPath::new(1usize, 5usize, 6usize, 1.0));
    let mut tn = TemporalNetwork::from_two_paths(paths);

    assert_eq!(tn.second_order_graph().giant_component().vertex_count(), n + 1);
    let null = tn.second_order_null_graph().unwrap();
    assert_eq!(null.vertex_count(), n + 1);
    for row in null.transition_matrix().rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }

    let pi = tn.stationary_distribution().unwrap();
    let total: f64 = pi.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(pi.iter().all(|&(_, p)| p > 0.0));
}

#[test]
fn test_null_model_degenerate() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    assert!(matches!(
        tn.second_order_null_graph(),
        Err(Error::DegenerateModel { vertices: 1 })
    ));
}

#[test]
fn test_unknown_vertex() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    assert_eq!(
        tn.first_order_graph().out_strength("Z"),
        Err(Error::UnknownVertex("Z".to_string()))
    );
}

#[test]
fn test_shuffle_edges_preserves_frequencies() {
    let tn = TemporalNetwork::from_edges([
        ("a", "b", 1),
        ("a", "b", 2),
        ("a", "b", 3),
        ("b", "c", 4),
    ]);
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let shuffled = tn.shuffle_edges(Some(8000), &mut rng);

    assert_eq!(shuffled.edge_count(), 8000);
    let ab = shuffled
        .store()
        .edges()
        .filter(|e| e.source.as_str() == "a" && e.target.as_str() == "b")
        .count();
    let share = ab as f64 / 8000.0;
    assert!((share - 0.75).abs() < 0.03, "a->b share {share}");
}

#[test]
fn test_shuffle_two_paths_preserves_triples() {
    let mut tn = TemporalNetwork::from_edges([("a", "b", 1), ("b", "c", 2), ("x", "y", 3), ("y", "z", 4)]);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut shuffled = tn.shuffle_two_paths(Some(2000), &mut rng);

    assert_eq!(shuffled.edge_count(), 2000);
    let tps = shuffled.two_paths();
    assert_eq!(tps.len(), 1000);

    let abc = tps
        .paths()
        .iter()
        .filter(|tp| tp.source.as_str() == "a")
        .count();
    let share = abc as f64 / 1000.0;
    assert!((share - 0.5).abs() < 0.08, "a,b,c share {share}");
    assert!(tps
        .paths()
        .iter()
        .all(|tp| matches!(tp.mid.as_str(), "b" | "y")));
}

#[test]
fn test_shuffle_zero_length_is_default() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    assert_eq!(tn.shuffle_edges(Some(0), &mut rng).edge_count(), 4);
    assert_eq!(tn.shuffle_two_paths(Some(0), &mut rng).edge_count(), 4);
}

#[test]
fn test_shuffles_are_reproducible() {
    let mut tn = TemporalNetwork::from_edges(scenario());

    let a = tn.shuffle_two_paths(Some(10), &mut ChaCha8Rng::seed_from_u64(1));
    let b = tn.shuffle_two_paths(Some(10), &mut ChaCha8Rng::seed_from_u64(1));
    let a: Vec<_> = a.store().edges().collect();
    let b: Vec<_> = b.store().edges().collect();
    assert_eq!(a, b);
}

#[test]
fn test_from_two_paths() {
    let mut tn = TemporalNetwork::from_two_paths([
        TwoPath::new("a", "b", "c", 2.0),
        TwoPath::new("a", "b", "d", 1.0),
    ]);

    assert_eq!(tn.two_path_count(), 2);
    let g1 = tn.first_order_graph();
    assert_eq!(g1.edge_weight("a", "b").unwrap(), Some(3.0));
    assert_eq!(g1.edge_weight("b", "d").unwrap(), Some(1.0));
}

#[test]
fn test_graph_serializes_with_petgraph_layout() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    let g2 = tn.second_order_graph();

    let value = serde_json::to_value(g2).unwrap();
    assert_eq!(value["order"], 2);
    assert_eq!(value["graph"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(value["graph"]["edges"].as_array().unwrap().len(), 2);
    assert_eq!(value["graph"]["nodes"][0]["name"], "A,B");
}

#[test]
fn test_summary_and_config_serialize() {
    let mut tn = TemporalNetwork::from_edges(scenario());
    tn.two_path_count();

    let summary = serde_json::to_value(tn.summary()).unwrap();
    assert_eq!(summary["vertices"], 4);
    assert_eq!(summary["two_paths"], 2);

    let config = serde_json::to_value(tn.config()).unwrap();
    assert_eq!(config["max_time_diff"], 1);
    assert_eq!(config["separator"], ",");
    assert_eq!(config["first_order_mode"], "TwoPaths");
}
