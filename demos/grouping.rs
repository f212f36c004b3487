//! Group a handful of tool descriptions by hand-made embeddings.

use embedding_grouper::cluster::{EmbeddingsGrouper, GroupingOptions, Node};
use embedding_grouper::Embedding;
use tracing_subscriber::EnvFilter;

fn main() -> embedding_grouper::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // Axes: files, git, tests.
    let tools = [
        ("read_file", [0.95, 0.05, 0.0]),
        ("write_file", [0.9, 0.1, 0.05]),
        ("list_dir", [0.85, 0.0, 0.1]),
        ("git_commit", [0.1, 0.95, 0.0]),
        ("git_diff", [0.15, 0.9, 0.1]),
        ("run_tests", [0.05, 0.1, 0.95]),
        ("test_failures", [0.0, 0.05, 0.9]),
    ];

    let mut grouper = EmbeddingsGrouper::new(GroupingOptions::default().with_eps(0.9));
    for (name, values) in tools {
        grouper.add_node(Node::new(name, Embedding::new("demo-3", values.to_vec())))?;
    }

    println!("=== incremental ({} clusters) ===", grouper.cluster_count());
    print_clusters(&grouper);

    grouper.recluster();
    println!("\n=== recluster eps=0.9 ({} clusters) ===", grouper.cluster_count());
    print_clusters(&grouper);

    let tuning = grouper.tune_threshold_for_target_clusters(2)?;
    println!(
        "\n=== tuned: p{} threshold={:.4} ({} clusters) ===",
        tuning.percentile, tuning.threshold, tuning.cluster_count
    );
    print_clusters(&grouper);

    Ok(())
}

fn print_clusters(grouper: &EmbeddingsGrouper<&str>) {
    for cluster in grouper.clusters() {
        let names: Vec<&str> = cluster
            .members()
            .iter()
            .filter_map(|&id| grouper.node(id).map(|n| n.value))
            .collect();
        println!("  {} => {}", cluster.id(), names.join(", "));
    }
}
