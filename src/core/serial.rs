use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::domain::model::SensorReading;
use crate::domain::ports::SensorSource;
use crate::utils::error::Result;
use crate::utils::validation::validate_machine_id;

/// Settle time after opening the port; Arduino-class boards reset on DTR
/// and drop the first moments of output.
const RESET_SETTLE: Duration = Duration::from_secs(2);

/// Delay before a reconnect attempt after a serial error or EOF.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// One newline-delimited JSON frame from the device. Unknown fields are
/// ignored; missing fields fall back to defaults rather than dropping the
/// frame, matching what the firmware has historically sent.
#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default = "default_machine_id")]
    machine_id: String,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    vibration: f64,
    #[serde(default)]
    pressure: f64,
    #[serde(default)]
    rpm: f64,
}

fn default_machine_id() -> String {
    "unknown".to_string()
}

/// `Lines::next_line` reports undecodable bytes as InvalidData. That is a
/// single garbled line, not a dead connection, so it must not trigger the
/// reconnect cycle.
fn is_decode_error(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::InvalidData
}

/// Reads sensor frames from a serial device, reconnecting forever on loss.
pub struct SerialSource {
    port_path: String,
    baud: u32,
    reader: Option<Lines<BufReader<SerialStream>>>,
}

impl SerialSource {
    /// Open the port once up front so the caller can decide on mock fallback
    /// when no device is attached at startup.
    pub async fn open(port_path: &str, baud: u32) -> Result<Self> {
        let mut source = Self {
            port_path: port_path.to_string(),
            baud,
            reader: None,
        };
        source.connect().await?;
        Ok(source)
    }

    async fn connect(&mut self) -> Result<()> {
        let stream = tokio_serial::new(self.port_path.as_str(), self.baud).open_native_async()?;
        tokio::time::sleep(RESET_SETTLE).await;
        self.reader = Some(BufReader::new(stream).lines());
        tracing::info!("🔌 Connected to sensor device on {}", self.port_path);
        Ok(())
    }

    async fn reconnect_after_delay(&mut self) {
        self.reader = None;
        loop {
            tracing::info!(
                "Waiting {}s to reconnect to {}...",
                RECONNECT_DELAY.as_secs(),
                self.port_path
            );
            tokio::time::sleep(RECONNECT_DELAY).await;
            match self.connect().await {
                Ok(()) => return,
                Err(e) => tracing::warn!("Reconnect to {} failed: {}", self.port_path, e),
            }
        }
    }

    /// Machine ids from the wire end up as file-name prefixes in the data
    /// directory, so anything with path separators (or nothing at all)
    /// falls back to "unknown" instead of escaping the directory.
    fn sanitize_machine_id(&self, machine_id: String) -> String {
        if validate_machine_id("machine_id", &machine_id).is_ok() {
            machine_id
        } else {
            tracing::warn!(
                "Frame from {} carries unusable machine id {:?}; using \"unknown\"",
                self.port_path,
                machine_id
            );
            "unknown".to_string()
        }
    }

    fn parse_line(&self, line: &str) -> Option<SensorReading> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<WireFrame>(line) {
            Ok(frame) => Some(SensorReading {
                machine_id: self.sanitize_machine_id(frame.machine_id),
                temperature: frame.temperature,
                vibration: frame.vibration,
                pressure: frame.pressure,
                rpm: frame.rpm,
                timestamp: Utc::now(),
            }),
            Err(e) => {
                tracing::warn!("Invalid frame from {}: {} ({})", self.port_path, line, e);
                None
            }
        }
    }
}

#[async_trait]
impl SensorSource for SerialSource {
    async fn next_reading(&mut self) -> Result<SensorReading> {
        loop {
            let next = match self.reader.as_mut() {
                Some(reader) => reader.next_line().await,
                None => {
                    self.reconnect_after_delay().await;
                    continue;
                }
            };

            match next {
                Ok(Some(line)) => {
                    if let Some(reading) = self.parse_line(&line) {
                        tracing::debug!("Frame received from {}", reading.machine_id);
                        return Ok(reading);
                    }
                    // Malformed frame: keep reading.
                }
                Ok(None) => {
                    tracing::warn!("Serial stream {} reached EOF", self.port_path);
                    self.reader = None;
                }
                Err(e) if is_decode_error(&e) => {
                    tracing::warn!("Discarding undecodable line from {}: {}", self.port_path, e);
                }
                Err(e) => {
                    tracing::warn!("Serial read error on {}: {}", self.port_path, e);
                    self.reader = None;
                }
            }
        }
    }

    fn describe(&self) -> String {
        format!("serial device {} @ {} baud", self.port_path, self.baud)
    }
}
