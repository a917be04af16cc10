use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::processor::process_reading;
use crate::domain::model::{SensorReading, Thresholds};
use crate::domain::ports::{ReadingStore, SensorSource};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Bound on in-flight readings between acquisition and processing. The
/// processor is disk-bound; if it falls this far behind, acquisition blocks
/// rather than growing without limit.
const CHANNEL_CAPACITY: usize = 64;

/// Resource stats are logged every this many readings when monitoring is on.
const STATS_EVERY: u64 = 100;

#[derive(Debug, Default, Clone, Copy)]
pub struct AgentSummary {
    pub readings: u64,
    pub anomalies: u64,
}

/// Wires a sensor source to the processor and store: one acquisition task
/// feeding a bounded channel, one processing loop draining it.
pub struct Agent<R: ReadingStore> {
    source: Box<dyn SensorSource>,
    store: R,
    thresholds: Thresholds,
    monitor: SystemMonitor,
}

impl<R: ReadingStore> Agent<R> {
    pub fn new(source: Box<dyn SensorSource>, store: R, thresholds: Thresholds) -> Self {
        Self::new_with_monitoring(source, store, thresholds, false)
    }

    pub fn new_with_monitoring(
        source: Box<dyn SensorSource>,
        store: R,
        thresholds: Thresholds,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            source,
            store,
            thresholds,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Run until the shutdown future resolves or the source task ends.
    /// Already-queued readings are drained before returning, so a clean
    /// shutdown loses nothing that was received.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<AgentSummary> {
        let Agent {
            mut source,
            store,
            thresholds,
            monitor,
        } = self;

        tracing::info!("📡 Acquiring from {}", source.describe());

        let (tx, mut rx) = mpsc::channel::<SensorReading>(CHANNEL_CAPACITY);
        let acquisition = tokio::spawn(async move {
            loop {
                match source.next_reading().await {
                    Ok(reading) => {
                        if tx.send(reading).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Sensor source failed: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        let mut summary = AgentSummary::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down gracefully...");
                    break;
                }
                maybe = rx.recv() => match maybe {
                    Some(reading) => {
                        handle_reading(&store, &thresholds, &reading, &mut summary).await;
                        if monitor.is_enabled() && summary.readings % STATS_EVERY == 0 {
                            monitor.log_stats("Collection");
                        }
                    }
                    None => {
                        tracing::warn!("Sensor source closed the channel");
                        break;
                    }
                }
            }
        }

        // Drain whatever arrived before the shutdown signal.
        rx.close();
        while let Some(reading) = rx.recv().await {
            handle_reading(&store, &thresholds, &reading, &mut summary).await;
        }
        acquisition.abort();

        monitor.log_final_stats();
        tracing::info!(
            "Processed {} readings ({} anomalous)",
            summary.readings,
            summary.anomalies
        );
        Ok(summary)
    }
}

/// Process and persist one reading. Storage failures are logged and the
/// loop keeps going; a full disk should not stop acquisition.
async fn handle_reading<R: ReadingStore>(
    store: &R,
    thresholds: &Thresholds,
    reading: &SensorReading,
    summary: &mut AgentSummary,
) {
    let processed = process_reading(reading, thresholds);
    summary.readings += 1;

    if let Err(e) = store.append_reading(&processed).await {
        tracing::error!("Failed to store reading: {}", e.user_friendly_message());
        return;
    }

    if processed.anomaly_detected {
        summary.anomalies += 1;

        if let Err(e) = store.append_alert(&processed).await {
            tracing::error!("Failed to store alert: {}", e.user_friendly_message());
        }
        if let Err(e) = store.write_latest_alert(&processed).await {
            tracing::error!("Failed to write latest alert: {}", e.user_friendly_message());
        }

        match processed.failure_probability {
            Some(score) if score > 0.0 => {
                tracing::warn!(
                    "⚠️ FAILURE PREDICTED for {}! Kind: {:?}, Score: {:.4}",
                    processed.machine_id,
                    processed.failure_kind,
                    score
                );
            }
            _ => {
                tracing::warn!(
                    "⚠️ Anomalous reading from {} (no failure weight)",
                    processed.machine_id
                );
            }
        }
    } else {
        tracing::debug!("Normal operation for {}", processed.machine_id);
    }
}
