use std::{io, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use control::{
    CommandTransport, ControlSession, Dispatch, RecordingTransport, ResolverMode, TransportError,
    UdpCommandTransport, DEFAULT_COMMAND_PORT,
};
use crossterm::{
    event::{
        Event, EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement},
};
use futures::StreamExt;
use telemetry::{
    TelemetryCursor, TelemetryListener, TelemetryStore, DEFAULT_TELEMETRY_BIND, PUBLISH_INTERVAL,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod keys;
mod status;

use keys::{translate, KeyInput, HELP};
use status::{redraw, StatusView};

const KEY_EVENT_BUFFER: usize = 64;
const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(about = "Drive the robot from the keyboard over UDP")]
struct Args {
    /// Robot address; prompted for when omitted.
    #[arg(long)]
    robot_host: Option<String>,
    #[arg(long, default_value_t = DEFAULT_COMMAND_PORT)]
    command_port: u16,
    #[arg(long, default_value = DEFAULT_TELEMETRY_BIND)]
    telemetry_bind: String,
    /// Do not listen for robot telemetry.
    #[arg(long)]
    no_telemetry: bool,
    #[arg(long, default_value_t = ResolverMode::TurnContinuation)]
    mode: ResolverMode,
    /// Record commands instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

/// Raw mode plus key release reporting for as long as it lives.
struct TerminalGuard {
    enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let robot_host = match args.robot_host.clone() {
        Some(host) => host,
        None => prompt_robot_host().await?,
    };
    if robot_host.trim().is_empty() {
        bail!("robot address cannot be empty");
    }

    let transport: Arc<dyn CommandTransport> = if args.dry_run {
        Arc::new(RecordingTransport::new())
    } else {
        Arc::new(
            UdpCommandTransport::bind(robot_host.trim(), args.command_port)
                .await
                .context("failed to create command socket")?,
        )
    };
    let session = Arc::new(ControlSession::new(transport, args.mode));

    let telemetry = TelemetryStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_task = if args.no_telemetry {
        None
    } else {
        let listener = TelemetryListener::bind(&args.telemetry_bind)
            .await
            .with_context(|| format!("failed to bind telemetry socket on {}", args.telemetry_bind))?;
        Some(tokio::spawn(listener.run(telemetry.clone(), shutdown_rx)))
    };

    println!("Targeting robot at {} for commands.", session.target());
    if listener_task.is_some() {
        println!("Listening for telemetry on {}.", args.telemetry_bind);
    }
    println!("Resolver mode: {}.", session.mode());
    println!();
    for line in HELP {
        println!("{line}");
    }
    println!("{}", "-".repeat(30));

    let outcome = drive(&session, &telemetry).await;

    let _ = shutdown_tx.send(true);
    if let Some(task) = listener_task {
        if tokio::time::timeout(LISTENER_STOP_TIMEOUT, task).await.is_err() {
            warn!("telemetry listener did not stop in time");
        }
    }

    println!();
    println!("Sending final STOP command.");
    if let Err(error) = session.shutdown().await {
        eprintln!("Final stop was not delivered: {error}");
    }
    println!("Exited.");

    outcome
}

async fn prompt_robot_host() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter the robot's IP address (e.g., 192.168.137.226): ")
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines
        .next_line()
        .await
        .context("failed to read robot address")?
        .unwrap_or_default();
    Ok(line)
}

/// Runs the key event loop until a quit key or the end of terminal input.
async fn drive(session: &ControlSession, telemetry: &TelemetryStore) -> Result<()> {
    let guard = TerminalGuard::enter().context("failed to switch terminal to raw mode")?;
    if !guard.enhanced {
        warn!("terminal does not report key releases; keys will stay held until pressed again");
    }

    let (key_tx, mut key_rx) = mpsc::channel(KEY_EVENT_BUFFER);
    let reader = spawn_key_reader(key_tx);

    let mut view = StatusView::default();
    let mut cursor = TelemetryCursor::new();
    let mut ticker = interval(PUBLISH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    redraw(&view.render())?;

    loop {
        tokio::select! {
            input = key_rx.recv() => {
                let result = match input {
                    None | Some(KeyInput::Quit) => break,
                    Some(KeyInput::Press(key)) => session.key_down(key).await,
                    Some(KeyInput::Release(key)) => session.key_up(key).await,
                };
                if record_dispatch(&mut view, result) {
                    redraw(&view.render())?;
                }
            }
            _ = ticker.tick() => {
                if on_tick(session, telemetry, &mut cursor, &mut view).await {
                    redraw(&view.render())?;
                }
            }
        }
    }

    reader.abort();
    drop(guard);
    info!("key loop finished");
    Ok(())
}

/// Repeats a pending stop or failed send, then folds in changed telemetry.
/// Returns whether the status line needs a redraw.
async fn on_tick(
    session: &ControlSession,
    telemetry: &TelemetryStore,
    cursor: &mut TelemetryCursor,
    view: &mut StatusView,
) -> bool {
    let mut dirty = record_dispatch(view, session.tick().await);

    let changed = cursor.diff(&telemetry.snapshot().await);
    if !changed.is_empty() {
        changed.into_iter().for_each(|event| view.absorb(event));
        dirty = true;
    }
    dirty
}

fn record_dispatch(view: &mut StatusView, result: Result<Option<Dispatch>, TransportError>) -> bool {
    match result {
        Ok(Some(Dispatch::Sent(command))) => {
            view.command = Some(command);
            view.error = None;
            true
        }
        Ok(Some(Dispatch::Suppressed(_))) | Ok(None) => false,
        Err(error) => {
            error!(%error, "command send failed");
            view.error = Some(error.to_string());
            true
        }
    }
}

fn spawn_key_reader(key_tx: mpsc::Sender<KeyInput>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            match event {
                Ok(Event::Key(key_event)) => {
                    if let Some(input) = translate(&key_event) {
                        if key_tx.send(input).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    error!(%error, "terminal input failed");
                    break;
                }
            }
        }
    })
}
