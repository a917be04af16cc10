use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::domain::model::SensorReading;
use crate::domain::ports::SensorSource;
use crate::utils::error::Result;

/// Default cadence of the synthetic generator.
pub const DEFAULT_MOCK_INTERVAL: Duration = Duration::from_millis(500);

/// Synthetic readings for running without hardware attached. The ranges
/// straddle the default normal bands so both the normal and the anomalous
/// paths get exercised.
pub struct MockSource {
    machine_id: String,
    interval: Duration,
}

impl MockSource {
    pub fn new(machine_id: &str) -> Self {
        Self::with_interval(machine_id, DEFAULT_MOCK_INTERVAL)
    }

    pub fn with_interval(machine_id: &str, interval: Duration) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            interval,
        }
    }

    fn generate(&self) -> SensorReading {
        let mut rng = rand::rng();
        SensorReading {
            machine_id: self.machine_id.clone(),
            temperature: rng.random_range(45.0..100.0),
            vibration: rng.random_range(0.05..6.5),
            pressure: rng.random_range(0.7..1.35),
            rpm: rng.random_range(900.0..3200.0),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
impl SensorSource for MockSource {
    async fn next_reading(&mut self) -> Result<SensorReading> {
        tokio::time::sleep(self.interval).await;
        Ok(self.generate())
    }

    fn describe(&self) -> String {
        format!(
            "mock generator for {} every {}ms",
            self.machine_id,
            self.interval.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_readings_stay_in_the_documented_ranges() {
        let source = MockSource::new("machine-01");
        for _ in 0..200 {
            let r = source.generate();
            assert_eq!(r.machine_id, "machine-01");
            assert!((45.0..100.0).contains(&r.temperature));
            assert!((0.05..6.5).contains(&r.vibration));
            assert!((0.7..1.35).contains(&r.pressure));
            assert!((900.0..3200.0).contains(&r.rpm));
        }
    }

    #[tokio::test]
    async fn next_reading_respects_the_interval() {
        let mut source = MockSource::with_interval("machine-01", Duration::from_millis(10));
        let start = std::time::Instant::now();
        source.next_reading().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
