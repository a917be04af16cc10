use crate::domain::model::{ProcessedReading, SensorReading};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A source of sensor readings. Implementations are expected to block
/// (asynchronously) until the next reading is available and to handle
/// their own reconnection; returning an error is reserved for states
/// the source cannot recover from by itself.
#[async_trait]
pub trait SensorSource: Send {
    async fn next_reading(&mut self) -> Result<SensorReading>;

    /// Human-readable description for startup logging.
    fn describe(&self) -> String;
}

/// Persistence seam for processed readings.
pub trait ReadingStore: Send + Sync {
    fn append_reading(
        &self,
        reading: &ProcessedReading,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn append_alert(
        &self,
        reading: &ProcessedReading,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn write_latest_alert(
        &self,
        reading: &ProcessedReading,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn load_history(
        &self,
        machine_id: &str,
        days: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ProcessedReading>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn port_path(&self) -> &str;
    fn baud_rate(&self) -> u32;
    fn data_dir(&self) -> &str;
    fn machine_id(&self) -> &str;
    fn use_mock(&self) -> bool;
}
