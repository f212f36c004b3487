use embedding_grouper::cluster::{EmbeddingsGrouper, GroupingOptions, Node};
use embedding_grouper::{vector, Embedding};

const MODEL: &str = "scenario-4";

fn node(name: &str, values: [f32; 4]) -> Node<String> {
    Node::new(name.to_string(), Embedding::new(MODEL, values.to_vec()))
}

#[test]
fn identical_embeddings_cluster_together() {
    let mut g = EmbeddingsGrouper::default();
    let ids = g
        .add_nodes(
            ["a", "b", "c"].map(|n| node(n, [1.0, 0.0, 0.0, 0.0])),
            true,
        )
        .unwrap();

    assert_eq!(g.cluster_count(), 1);
    let cluster = g.clusters().next().unwrap();
    assert_eq!(cluster.len(), 3);
    for id in ids {
        assert!(cluster.contains(id));
    }
    assert_eq!(cluster.centroid(), &[1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn orthogonal_embeddings_separate() {
    let mut g = EmbeddingsGrouper::default();
    let a = g.add_node(node("a", [1.0, 0.0, 0.0, 0.0])).unwrap();
    let b = g.add_node(node("b", [0.0, 1.0, 0.0, 0.0])).unwrap();

    assert_eq!(g.cluster_count(), 2);
    assert!(g.clusters().all(|c| c.len() == 1));
    assert_ne!(
        g.cluster_for_node(a).unwrap().id(),
        g.cluster_for_node(b).unwrap().id()
    );
}

#[test]
fn bulk_add_preserves_count() {
    for recluster_after in [false, true] {
        let mut g = EmbeddingsGrouper::default();
        let nodes = (0..100).map(|i| {
            let a = (i as f32 * 3.7).to_radians();
            let b = (i as f32 * 1.3).to_radians();
            node(&format!("n{i}"), [a.cos(), a.sin(), b.cos(), b.sin().abs()])
        });
        let ids = g.add_nodes(nodes, recluster_after).unwrap();

        assert_eq!(ids.len(), 100);
        let total: usize = g.clusters().map(|c| c.len()).sum();
        assert_eq!(total, 100);
        if !recluster_after {
            assert_eq!(g.cluster_count(), 100);
        }
    }
}

#[test]
fn min_cluster_size_suppresses_merge() {
    let opts = GroupingOptions::default()
        .with_eps(0.8)
        .with_min_cluster_size(3);
    let mut g = EmbeddingsGrouper::new(opts);
    let ids = g
        .add_nodes(
            vec![
                node("a", [1.0, 0.1, 0.0, 0.0]),
                node("b", [1.0, 0.0, 0.1, 0.0]),
            ],
            true,
        )
        .unwrap();
    assert!(g.similarity(ids[0], ids[1]).unwrap() > 0.8);

    assert_eq!(g.cluster_count(), 2);
    assert!(g.clusters().all(|c| c.len() == 1));

    // A third similar node completes the group.
    g.add_nodes(vec![node("c", [1.0, 0.0, 0.0, 0.1])], true)
        .unwrap();
    assert_eq!(g.cluster_count(), 1);
}

#[test]
fn incremental_and_full_passes_can_disagree() {
    // b bridges a and c: a~b and b~c clear eps, a~c does not.
    let opts = GroupingOptions::default().with_eps(0.9);
    let a = node("a", [1.0, 0.0, 0.0, 0.0]);
    let c = node("c", [0.766, 0.643, 0.0, 0.0]);
    let b = node("b", [0.94, 0.342, 0.0, 0.0]);
    assert!(vector::cosine_similarity(&a.embedding.values, &c.embedding.values) < 0.9);

    let mut g = EmbeddingsGrouper::new(opts);
    g.add_node(a).unwrap();
    g.add_node(c).unwrap();
    g.add_node(b).unwrap();
    // Greedy: a and c started separate clusters, b joined one of them.
    assert_eq!(g.cluster_count(), 2);

    // Full pass: connected through b.
    g.recluster();
    assert_eq!(g.cluster_count(), 1);
}

#[test]
fn removing_last_member_deletes_cluster() {
    let mut g = EmbeddingsGrouper::default();
    let a = g.add_node(node("a", [1.0, 0.0, 0.0, 0.0])).unwrap();
    let b = g.add_node(node("b", [0.0, 0.0, 0.0, 1.0])).unwrap();
    assert_eq!(g.cluster_count(), 2);

    assert!(g.remove_node(b));
    assert_eq!(g.cluster_count(), 1);
    assert!(g.cluster_for_node(b).is_none());
    assert!(g.cluster_for_node(a).is_some());
}

#[test]
fn zero_vectors_get_zero_centroid() {
    let mut g = EmbeddingsGrouper::new(GroupingOptions::default().with_eps(0.0));
    g.add_nodes(
        vec![node("z1", [0.0; 4]), node("z2", [0.0; 4])],
        true,
    )
    .unwrap();
    assert_eq!(g.cluster_count(), 1);
    let centroid = g.clusters().next().unwrap().centroid();
    assert!(centroid.iter().all(|&x| x == 0.0));
}

#[test]
fn tuning_reaches_target() {
    let mut g = EmbeddingsGrouper::default();
    let mut nodes = Vec::new();
    for group in 0..4 {
        for i in 0..5 {
            let mut v = [0.0; 4];
            v[group] = 1.0;
            v[(group + 1) % 4] = 0.02 * i as f32;
            nodes.push(node(&format!("g{group}-{i}"), v));
        }
    }
    g.add_nodes(nodes, false).unwrap();

    let tuning = g.tune_threshold_for_target_clusters(4).unwrap();
    assert!(tuning.cluster_count <= 4);
    assert_eq!(g.cluster_count(), tuning.cluster_count);
    assert_eq!(g.len(), 20);
    let total: usize = g.clusters().map(|c| c.len()).sum();
    assert_eq!(total, 20);
}

#[test]
fn snapshot_is_detached() {
    let mut g = EmbeddingsGrouper::default();
    g.add_node(node("a", [1.0, 0.0, 0.0, 0.0])).unwrap();
    let snapshot = g.cluster_snapshot();
    g.add_node(node("b", [0.0, 1.0, 0.0, 0.0])).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(g.cluster_count(), 2);
}
