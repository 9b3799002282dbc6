use std::sync::Arc;

use shared::domain::{LogicalKey, MotionCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::TransportError,
    resolver::{resolve_command, should_transmit, HeldKeys, ResolverMode},
    transport::CommandTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent(MotionCommand),
    /// Same motion as the last transmission; nothing went on the wire.
    Suppressed(MotionCommand),
}

impl Dispatch {
    pub fn was_sent(self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

#[derive(Default)]
struct SessionState {
    held: HeldKeys,
    last_sent: Option<MotionCommand>,
    delivery_failed: bool,
    closed: bool,
}

/// Control state for one robot target.
///
/// Held keys and the last transmitted command sit behind a single lock that
/// stays held across the transport send, so concurrent callers (key events,
/// HTTP requests, shutdown) are serialized and `last_sent` always reflects
/// what actually reached the socket.
pub struct ControlSession {
    transport: Arc<dyn CommandTransport>,
    mode: ResolverMode,
    state: Mutex<SessionState>,
}

impl ControlSession {
    pub fn new(transport: Arc<dyn CommandTransport>, mode: ResolverMode) -> Self {
        Self {
            transport,
            mode,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn mode(&self) -> ResolverMode {
        self.mode
    }

    pub fn target(&self) -> String {
        self.transport.describe()
    }

    pub async fn last_sent(&self) -> Option<MotionCommand> {
        self.state.lock().await.last_sent
    }

    pub async fn held_keys(&self) -> HeldKeys {
        self.state.lock().await.held.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// `Ok(None)` when the key was already held or the session is closed.
    pub async fn key_down(&self, key: LogicalKey) -> Result<Option<Dispatch>, TransportError> {
        let mut state = self.state.lock().await;
        if state.closed || !state.held.press(key) {
            return Ok(None);
        }
        debug!(%key, held = %state.held, "key down");
        self.evaluate(&mut state).await.map(Some)
    }

    /// `Ok(None)` when the key was not held or the session is closed.
    pub async fn key_up(&self, key: LogicalKey) -> Result<Option<Dispatch>, TransportError> {
        let mut state = self.state.lock().await;
        if state.closed || !state.held.release(key) {
            return Ok(None);
        }
        debug!(%key, held = %state.held, "key up");
        self.evaluate(&mut state).await.map(Some)
    }

    /// Resolves again with the current held keys. A resting robot gets its
    /// stop repeated.
    pub async fn reevaluate(&self) -> Result<Option<Dispatch>, TransportError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(None);
        }
        self.evaluate(&mut state).await.map(Some)
    }

    /// Periodic re-evaluation. Only acts while the robot should be at rest
    /// or the previous send failed, so a lost stop keeps being repeated
    /// without flooding the link during normal driving.
    pub async fn tick(&self) -> Result<Option<Dispatch>, TransportError> {
        let mut state = self.state.lock().await;
        let resting = state.last_sent.is_some_and(MotionCommand::is_stop);
        if state.closed || !(resting || state.delivery_failed) {
            return Ok(None);
        }
        self.evaluate(&mut state).await.map(Some)
    }

    /// Sends a command chosen outside the resolver, such as a dashboard
    /// button, through the same transmit gate.
    pub async fn submit(&self, command: MotionCommand) -> Result<Dispatch, TransportError> {
        let mut state = self.state.lock().await;
        self.transmit(&mut state, command).await
    }

    /// Closes the session and issues the final stop. Later key events are
    /// ignored.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.held = HeldKeys::new();
        info!(robot = %self.transport.describe(), "sending final stop");
        self.transmit(&mut state, MotionCommand::STOP).await?;
        Ok(())
    }

    async fn evaluate(&self, state: &mut SessionState) -> Result<Dispatch, TransportError> {
        let command = resolve_command(&state.held, state.last_sent, self.mode);
        self.transmit(state, command).await
    }

    async fn transmit(
        &self,
        state: &mut SessionState,
        command: MotionCommand,
    ) -> Result<Dispatch, TransportError> {
        if !should_transmit(command, state.last_sent) {
            return Ok(Dispatch::Suppressed(command));
        }

        match self.transport.send(command).await {
            Ok(()) => {
                state.last_sent = Some(command);
                state.delivery_failed = false;
                Ok(Dispatch::Sent(command))
            }
            Err(error) => {
                state.delivery_failed = true;
                warn!(token = %command, %error, "command not delivered");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
