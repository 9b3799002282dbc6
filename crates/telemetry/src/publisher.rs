use std::time::Duration;

use shared::protocol::{TelemetryEvent, TelemetrySnapshot};
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::store::TelemetryStore;

pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(200);
const SUBSCRIBER_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct TelemetryCursor {
    last: [TelemetryEvent; 4],
}

impl Default for TelemetryCursor {
    fn default() -> Self {
        Self {
            last: TelemetrySnapshot::default().events(),
        }
    }
}

impl TelemetryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diff(&mut self, snapshot: &TelemetrySnapshot) -> Vec<TelemetryEvent> {
        let mut changed = Vec::new();
        for (last, current) in self.last.iter_mut().zip(snapshot.events()) {
            if *last != current {
                *last = current.clone();
                changed.push(current);
            }
        }
        changed
    }
}

/// Starts one publishing task for one subscriber. The task ends once the
/// returned receiver is dropped.
pub fn spawn_subscriber(store: TelemetryStore, period: Duration) -> mpsc::Receiver<TelemetryEvent> {
    let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);

    tokio::spawn(async move {
        let mut cursor = TelemetryCursor::new();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let snapshot = store.snapshot().await;
            for event in cursor.diff(&snapshot) {
                if tx.send(event).await.is_err() {
                    debug!("telemetry subscriber went away");
                    return;
                }
            }
            if tx.is_closed() {
                debug!("telemetry subscriber went away");
                return;
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::TelemetryReading;
    use shared::protocol::{UartPacketKind, UartStatus};

    #[test]
    fn unset_channels_are_not_published() {
        let mut cursor = TelemetryCursor::new();
        assert!(cursor.diff(&TelemetrySnapshot::default()).is_empty());
    }

    #[test]
    fn only_changed_channels_are_published() {
        let mut cursor = TelemetryCursor::new();
        let mut snapshot = TelemetrySnapshot {
            frequency_hz: Some(50.0),
            magnet_direction: Some("N".into()),
            ..TelemetrySnapshot::default()
        };

        assert_eq!(
            cursor.diff(&snapshot),
            vec![
                TelemetryEvent::Frequency {
                    value: Some("50.00".into())
                },
                TelemetryEvent::MagnetDirection {
                    value: Some("N".into())
                },
            ]
        );
        assert!(cursor.diff(&snapshot).is_empty());

        snapshot.uart = Some(UartStatus {
            kind: UartPacketKind::Pkt,
            payload: "#01".into(),
        });
        assert_eq!(
            cursor.diff(&snapshot),
            vec![TelemetryEvent::UartData {
                packet_type: Some(UartPacketKind::Pkt),
                value: Some("#01".into()),
            }]
        );
    }

    #[test]
    fn uart_kind_change_alone_is_published() {
        let mut cursor = TelemetryCursor::new();
        let mut snapshot = TelemetrySnapshot {
            uart: Some(UartStatus {
                kind: UartPacketKind::Pkt,
                payload: "x".into(),
            }),
            ..TelemetrySnapshot::default()
        };
        cursor.diff(&snapshot);

        snapshot.uart = Some(UartStatus {
            kind: UartPacketKind::Fail,
            payload: "x".into(),
        });
        assert_eq!(cursor.diff(&snapshot).len(), 1);
    }

    #[tokio::test]
    async fn subscriber_task_forwards_store_updates() {
        let store = TelemetryStore::new();
        let mut rx = spawn_subscriber(store.clone(), Duration::from_millis(10));

        store.apply(TelemetryReading::IrPulse(2.0)).await;
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open");
        assert_eq!(
            event,
            TelemetryEvent::IrPulse {
                value: Some("2.00".into())
            }
        );
    }
}
