pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::ThresholdsConfig;

pub use crate::core::engine::{Agent, AgentSummary};
pub use crate::core::mock::MockSource;
pub use crate::core::monitor::{CsvMonitor, DriftMetrics};
pub use crate::core::processor::process_reading;
pub use crate::core::report::build_report;
pub use crate::core::serial::SerialSource;
pub use crate::core::store::CsvStore;
pub use crate::domain::model::{
    FailureKind, ProcessedReading, SensorReading, SensorReport, Thresholds,
};
pub use crate::domain::ports::{ConfigProvider, ReadingStore, SensorSource};
pub use crate::utils::error::{PdmError, Result};
