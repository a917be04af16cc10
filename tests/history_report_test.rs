use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pdm_agent::{
    build_report, Agent, CsvStore, FailureKind, ReadingStore, Result, SensorReading, SensorSource,
    Thresholds,
};
use tempfile::TempDir;

/// Yields a fixed sequence of readings, then parks until shutdown.
struct FixedSource {
    pending: Vec<SensorReading>,
}

#[async_trait]
impl SensorSource for FixedSource {
    async fn next_reading(&mut self) -> Result<SensorReading> {
        if let Some(reading) = self.pending.pop() {
            return Ok(reading);
        }
        std::future::pending::<()>().await;
        unreachable!()
    }

    fn describe(&self) -> String {
        "fixed test source".to_string()
    }
}

fn reading(temperature: f64, vibration: f64) -> SensorReading {
    SensorReading {
        machine_id: "press-7".to_string(),
        temperature,
        vibration,
        pressure: 1.0,
        rpm: 2000.0,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn anomalous_readings_produce_alert_files_and_reports() {
    let temp = TempDir::new().unwrap();
    let store = CsvStore::new(temp.path()).unwrap();

    // pop() takes from the back, so list the intended order reversed.
    let source = FixedSource {
        pending: vec![
            reading(96.0, 6.2), // overheating + bearing-level vibration
            reading(72.0, 2.1),
            reading(68.0, 1.8),
        ],
    };

    let agent = Agent::new(Box::new(source), store.clone(), Thresholds::default());
    let summary = agent
        .run(tokio::time::sleep(Duration::from_millis(250)))
        .await
        .unwrap();

    assert_eq!(summary.readings, 3);
    assert_eq!(summary.anomalies, 1);

    // Alerts CSV holds only the anomalous row.
    let alerts = std::fs::read_to_string(store.alerts_path("press-7")).unwrap();
    assert_eq!(alerts.lines().count(), 2);
    assert!(alerts.contains("Overheating"));

    // Latest alert JSON carries the prediction.
    let latest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(store.latest_alert_path("press-7")).unwrap(),
    )
    .unwrap();
    assert_eq!(latest["machine_id"], "press-7");
    assert_eq!(latest["failure_type"], "Overheating");
    let score = latest["failure_probability"].as_f64().unwrap();
    assert!((score - 0.7).abs() < 1e-9);

    // History feeds the report.
    let history = store.load_history("press-7", 7).await.unwrap();
    let report = build_report("press-7", &history).unwrap();
    assert_eq!(report.total_readings, 3);
    assert_eq!(report.anomaly_count, 1);
    assert_eq!(report.anomaly_percentage, 33.33);
    assert_eq!(report.max_temperature, 96.0);
    assert_eq!(report.max_vibration, 6.2);

    // Round-trip preserves the failure kind enum.
    let anomalous = history.iter().find(|r| r.anomaly_detected).unwrap();
    assert_eq!(anomalous.failure_kind, Some(FailureKind::Overheating));
}

#[tokio::test]
async fn report_on_unknown_machine_is_an_error() {
    let temp = TempDir::new().unwrap();
    let store = CsvStore::new(temp.path()).unwrap();

    let history = store.load_history("ghost", 7).await.unwrap();
    assert!(history.is_empty());
    assert!(build_report("ghost", &history).is_err());
}
