use std::time::Duration;

use pdm_agent::{Agent, CsvStore, MockSource, ReadingStore, Thresholds};
use tempfile::TempDir;

#[tokio::test]
async fn mock_agent_writes_csv_rows_end_to_end() {
    let temp = TempDir::new().unwrap();
    let store = CsvStore::new(temp.path()).unwrap();
    let source = MockSource::with_interval("it-machine", Duration::from_millis(5));

    let agent = Agent::new(Box::new(source), store.clone(), Thresholds::default());
    let summary = agent
        .run(tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert!(summary.readings > 0, "mock source should have produced data");

    let data_path = store.sensor_data_path("it-machine");
    assert!(data_path.exists());

    let content = std::fs::read_to_string(&data_path).unwrap();
    let lines = content.lines().count() as u64;
    assert_eq!(lines, summary.readings + 1, "header plus one line per reading");
    assert!(content.starts_with("timestamp,machine_id,temperature"));
}

#[tokio::test]
async fn stored_history_is_readable_after_a_run() {
    let temp = TempDir::new().unwrap();
    let store = CsvStore::new(temp.path()).unwrap();
    let source = MockSource::with_interval("it-machine", Duration::from_millis(5));

    let agent = Agent::new(Box::new(source), store.clone(), Thresholds::default());
    let summary = agent
        .run(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    let history = store.load_history("it-machine", 1).await.unwrap();
    assert_eq!(history.len() as u64, summary.readings);

    let anomalies = history.iter().filter(|r| r.anomaly_detected).count() as u64;
    assert_eq!(anomalies, summary.anomalies);
}

#[tokio::test]
async fn data_directory_is_created_if_missing() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("app").join("data");

    let store = CsvStore::new(&nested).unwrap();
    assert!(nested.exists());
    assert_eq!(store.data_dir(), nested.as_path());
}
