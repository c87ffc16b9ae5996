// Config-driven runs, loading TOML from temporary files

use causal_clocks::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_empty_config_runs_canonical_scenario() {
    let file = write_config("");
    let config = load_config(file.path().to_str().unwrap()).unwrap();
    let outcomes = Simulation::from_config(&config)
        .unwrap()
        .run_all(&config.simulation.disciplines)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].report.discipline, ClockDiscipline::Simple);
    assert_eq!(outcomes[1].report.rows(), vec![(1, 0, 11, 12), (2, 2, 13, 14), (3, 1, 15, 16)]);
}

#[tokio::test]
async fn test_config_topology_and_mode() {
    let file = write_config(
        r#"
        [simulation]
        disciplines = ["simple"]
        log_mode = "direct"

        [topology]
        node_count = 2
        skew = [{ node = 1, clock = 7 }]
        sends = [{ from = 1, to = 0 }, { from = 0, to = 1 }]
        "#,
    );
    let config = load_config(file.path().to_str().unwrap()).unwrap();
    let sim = Simulation::from_config(&config).unwrap();
    assert_eq!(sim.log_mode(), LogMode::Direct);
    let outcome = sim.run(ClockDiscipline::Simple).await.unwrap();
    assert_eq!(outcome.report.rows(), vec![(1, 1, 8, 1), (2, 0, 2, 9)]);
}

#[tokio::test]
async fn test_send_to_missing_node_fails_run() {
    let file = write_config(
        r#"
        [topology]
        node_count = 2
        skew = []
        sends = [{ from = 0, to = 4 }]
        "#,
    );
    let config = load_config(file.path().to_str().unwrap()).unwrap();
    let sim = Simulation::from_config(&config).unwrap();
    let err = sim.run(ClockDiscipline::Lamport).await.unwrap_err();
    assert!(matches!(err, SimError::Topology { node_count: 2, .. }));
}

#[test]
fn test_invalid_skew_rejected_on_load() {
    let file = write_config("[topology]\nnode_count = 1\n");
    // Default skew targets node 0, which exists.
    assert!(load_config(file.path().to_str().unwrap()).is_ok());

    let file = write_config("[topology]\nnode_count = 1\nskew = [{ node = 3, clock = 1 }]\n");
    assert!(matches!(
        load_config(file.path().to_str().unwrap()),
        Err(config::ConfigError::Invalid(_))
    ));
}
