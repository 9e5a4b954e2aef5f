//! End-to-end: a snapshot directory in, a cluster-assignment file out.

use layered_clustering_sim::config::Config;
use layered_clustering_sim::engine::SimulationEngine;
use std::time::Duration;

fn short_settling_config(output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.timing.tick_period = Duration::from_millis(5);
    config.engine.settling_window = Duration::from_millis(60);
    config.engine.snapshot_cap = 2;
    config.engine.output_dir = output_dir.to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn six_node_snapshot_produces_cluster_assignments_for_every_node() {
    let snapshots_dir = std::env::temp_dir().join("lcs_e2e_snapshots_six_node");
    let output_dir = std::env::temp_dir().join("lcs_e2e_output_six_node");
    std::fs::create_dir_all(&snapshots_dir).unwrap();
    let _ = std::fs::remove_dir_all(&output_dir);

    // Six satellites: {1,2,3} form a triad around PCH 2, {4,5,6} around PCH 5.
    let snapshot_path = snapshots_dir.join("snapshot_0.txt");
    std::fs::write(
        &snapshot_path,
        "0 0 0\n100 0 0\n200 0 0\n300 0 0\n400 0 0\n500 0 0\n",
    )
    .unwrap();

    let config = short_settling_config(&output_dir);
    let engine = SimulationEngine::new(config);
    engine.run(&snapshots_dir).await.unwrap();

    let result_path = output_dir.join("snapshot_0.txt");
    let contents = std::fs::read_to_string(&result_path).unwrap();
    assert!(contents.contains("1->"));
    assert!(contents.contains("6->"));
    // Every node reports an assignment; the edge list precedes a blank
    // separator before the id->cluster_id section.
    assert!(contents.contains("\n\n"));

    let _ = std::fs::remove_dir_all(&snapshots_dir);
    let _ = std::fs::remove_dir_all(&output_dir);
}

#[tokio::test]
async fn malformed_snapshot_is_skipped_without_aborting_the_run() {
    let snapshots_dir = std::env::temp_dir().join("lcs_e2e_snapshots_malformed");
    let output_dir = std::env::temp_dir().join("lcs_e2e_output_malformed");
    std::fs::create_dir_all(&snapshots_dir).unwrap();
    let _ = std::fs::remove_dir_all(&output_dir);

    std::fs::write(snapshots_dir.join("a_bad.txt"), "not a position line\n").unwrap();
    std::fs::write(snapshots_dir.join("b_good.txt"), "0 0 0\n100 0 0\n200 0 0\n").unwrap();

    let config = short_settling_config(&output_dir);
    let engine = SimulationEngine::new(config);

    // The bad snapshot fails to parse but the run as a whole still
    // succeeds; the good snapshot still produces output.
    engine.run(&snapshots_dir).await.unwrap();
    assert!(output_dir.join("b_good.txt").exists());
    assert!(!output_dir.join("a_bad.txt").exists());

    let _ = std::fs::remove_dir_all(&snapshots_dir);
    let _ = std::fs::remove_dir_all(&output_dir);
}
