use std::{net::SocketAddr, sync::Arc};

use chrono::Utc;
use shared::protocol::TelemetrySnapshot;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::parse::{parse_datagram, TelemetryParseError, TelemetryReading};

#[derive(Clone, Default)]
pub struct TelemetryStore {
    inner: Arc<RwLock<TelemetrySnapshot>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.read().await.clone()
    }

    pub async fn apply(&self, reading: TelemetryReading) {
        let mut snapshot = self.inner.write().await;
        match reading {
            TelemetryReading::Frequency(hz) => snapshot.frequency_hz = Some(hz),
            TelemetryReading::Uart(status) => snapshot.uart = Some(status),
            TelemetryReading::IrPulse(value) => snapshot.ir_pulse = Some(value),
            TelemetryReading::MagnetDirection(direction) => {
                snapshot.magnet_direction = Some(direction)
            }
        }
        snapshot.updated_at = Some(Utc::now());
    }

    /// Parses and stores one datagram. A malformed datagram is logged and the
    /// stored values stay as they were.
    pub async fn ingest(&self, datagram: &[u8], from: SocketAddr) -> Result<(), TelemetryParseError> {
        match parse_datagram(datagram) {
            Ok(reading) => {
                debug!(%from, ?reading, "telemetry received");
                self.apply(reading).await;
                Ok(())
            }
            Err(error) => {
                let preview: String = String::from_utf8_lossy(datagram).chars().take(40).collect();
                warn!(%from, %error, datagram = %preview, "dropping malformed telemetry");
                Err(error)
            }
        }
    }
}
