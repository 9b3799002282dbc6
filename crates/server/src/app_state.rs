use std::{sync::Arc, time::Duration};

use control::ControlSession;
use telemetry::TelemetryStore;
use tokio::sync::watch;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: Arc<ControlSession>,
    pub(crate) telemetry: TelemetryStore,
    pub(crate) publish_interval: Duration,
    pub(crate) shutdown: watch::Receiver<bool>,
}
