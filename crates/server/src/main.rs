use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    routing::{get, post},
    Json, Router,
};
use control::{CommandTransport, ControlSession, Dispatch, UdpCommandTransport};
use futures::{Stream, StreamExt};
use shared::{
    domain::MotionCommand,
    error::{ApiError, ErrorCode, TokenError},
    protocol::{CommandAccepted, CommandRequest, TelemetrySnapshot},
};
use telemetry::{spawn_subscriber, TelemetryListener, TelemetryStore};
use tokio::sync::watch;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");
const MAX_REQUEST_BODY_BYTES: usize = 1024;
const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();

    let transport = UdpCommandTransport::bind(settings.robot_host.clone(), settings.command_port)
        .await
        .context("failed to create command socket")?;
    info!(robot = %transport.describe(), mode = %settings.resolver_mode, "command transport ready");
    let session = Arc::new(ControlSession::new(
        Arc::new(transport),
        settings.resolver_mode,
    ));

    let telemetry = TelemetryStore::new();
    let listener = TelemetryListener::bind(&settings.telemetry_bind)
        .await
        .map_err(|error| {
            error!(
                bind = %settings.telemetry_bind,
                %error,
                "failed to bind telemetry socket; is another controller already listening?"
            );
            error
        })?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_task = tokio::spawn(listener.run(telemetry.clone(), shutdown_rx.clone()));

    let state = AppState {
        session: session.clone(),
        telemetry,
        publish_interval: settings.publish_interval(),
        shutdown: shutdown_rx,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "dashboard listening");
    let tcp = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if tokio::time::timeout(LISTENER_STOP_TIMEOUT, listener_task)
        .await
        .is_err()
    {
        warn!("telemetry listener did not stop in time");
    }
    if let Err(error) = session.shutdown().await {
        error!(%error, "final stop command was not delivered");
    }
    info!("server exited");
    Ok(())
}

/// Waits for Ctrl+C, then tells the listener and every open event stream
/// to wind down so the graceful shutdown can complete.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
    let _ = shutdown_tx.send(true);
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/healthz", get(healthz))
        .route("/send_command", post(send_command))
        .route("/stream_sensor_data", get(stream_sensor_data))
        .route("/telemetry", get(telemetry_snapshot))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn send_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandAccepted>, (StatusCode, Json<ApiError>)> {
    let command: MotionCommand = req
        .command
        .trim()
        .parse()
        .map_err(|e: TokenError| (StatusCode::BAD_REQUEST, Json(ApiError::from(e))))?;

    let dispatch = state.session.submit(command).await.map_err(|e| {
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new(ErrorCode::Transport, e.to_string())),
        )
    })?;

    let message = match dispatch {
        Dispatch::Sent(command) => {
            info!(token = %command, "dashboard command sent");
            format!("Command '{command}' sent.")
        }
        Dispatch::Suppressed(command) => format!("Command '{command}' already active."),
    };

    Ok(Json(CommandAccepted {
        command,
        transmitted: dispatch.was_sent(),
        message,
    }))
}

async fn telemetry_snapshot(State(state): State<Arc<AppState>>) -> Json<TelemetrySnapshot> {
    Json(state.telemetry.snapshot().await)
}

async fn stream_sensor_data(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = spawn_subscriber(state.telemetry.clone(), state.publish_interval);
    let mut shutdown = state.shutdown.clone();

    let stream = ReceiverStream::new(events)
        .map(|event| Event::default().json_data(event))
        .take_until(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
