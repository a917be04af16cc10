pub mod engine;
pub mod mock;
pub mod monitor;
pub mod processor;
pub mod report;
pub mod serial;
pub mod store;

pub use crate::domain::model::{ProcessedReading, SensorReading, SensorReport, Thresholds};
pub use crate::domain::ports::{ConfigProvider, ReadingStore, SensorSource};
pub use crate::utils::error::Result;
