use std::net::SocketAddr;

use tokio::{net::UdpSocket, sync::watch};
use tracing::{error, info};

use crate::store::TelemetryStore;

pub const DEFAULT_TELEMETRY_BIND: &str = "0.0.0.0:1001";
const MAX_DATAGRAM_BYTES: usize = 1024;

pub struct TelemetryListener {
    socket: UdpSocket,
}

impl TelemetryListener {
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, store: TelemetryStore, mut shutdown: watch::Receiver<bool>) {
        let local = self.socket.local_addr().ok();
        info!(addr = ?local, "telemetry listener started");
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => {
                        // Malformed datagrams are already logged by the store.
                        let _ = store.ingest(&buf[..len], from).await;
                    }
                    Err(err) => {
                        error!(%err, "telemetry socket error");
                        break;
                    }
                },
            }
        }

        info!(addr = ?local, "telemetry listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn stores_datagrams_until_shutdown() {
        let listener = TelemetryListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let store = TelemetryStore::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(listener.run(store.clone(), stop_rx));

        let robot = UdpSocket::bind("127.0.0.1:0").await.expect("robot");
        robot.send_to(b"FREQ:bogus", addr).await.expect("send");
        robot.send_to(b"FREQ:42.0", addr).await.expect("send");

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while store.snapshot().await.frequency_hz.is_none() {
            assert!(tokio::time::Instant::now() < deadline, "telemetry not stored");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.snapshot().await.frequency_hz, Some(42.0));

        stop_tx.send(true).expect("signal");
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("listener exits")
            .expect("join");
    }
}
