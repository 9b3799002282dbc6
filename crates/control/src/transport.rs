use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use shared::domain::MotionCommand;
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

use crate::error::TransportError;

pub const DEFAULT_COMMAND_PORT: u16 = 1000;

#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn send(&self, command: MotionCommand) -> Result<(), TransportError>;

    fn describe(&self) -> String;
}

/// Sends each token as one ASCII datagram. The host is resolved again on
/// every send so a robot that rejoins the hotspot under a new address is
/// picked up without restarting.
pub struct UdpCommandTransport {
    socket: UdpSocket,
    host: String,
    port: u16,
}

impl UdpCommandTransport {
    pub async fn bind(host: impl Into<String>, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            host: host.into(),
            port,
        })
    }

    async fn resolve(&self) -> Result<SocketAddr, TransportError> {
        let target = self.describe();
        let mut addrs = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|source| TransportError::Resolve {
                target: target.clone(),
                source,
            })?;
        addrs
            .find(SocketAddr::is_ipv4)
            .ok_or(TransportError::NoAddress { target })
    }
}

#[async_trait]
impl CommandTransport for UdpCommandTransport {
    async fn send(&self, command: MotionCommand) -> Result<(), TransportError> {
        let addr = self.resolve().await?;
        let token = command.token();
        self.socket
            .send_to(token.as_bytes(), addr)
            .await
            .map_err(|source| TransportError::Send {
                token: token.clone(),
                target: self.describe(),
                source,
            })?;
        debug!(%addr, %token, "command datagram sent");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Keeps every token in memory instead of sending it. Backs dry runs.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Default)]
struct RecordingState {
    sent: Vec<MotionCommand>,
    offline: Option<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MotionCommand> {
        self.lock().sent.clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.lock().sent.iter().map(|command| command.token()).collect()
    }

    /// Makes every following send fail until `set_online` is called.
    pub fn set_offline(&self, reason: impl Into<String>) {
        self.lock().offline = Some(reason.into());
    }

    pub fn set_online(&self) {
        self.lock().offline = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn send(&self, command: MotionCommand) -> Result<(), TransportError> {
        let mut state = self.lock();
        if let Some(reason) = &state.offline {
            return Err(TransportError::Offline(reason.clone()));
        }
        state.sent.push(command);
        debug!(token = %command, "command recorded");
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}
