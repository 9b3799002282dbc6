use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use control::{
    resolve_command, CommandTransport, HeldKeys, ResolverMode, UdpCommandTransport,
    DEFAULT_COMMAND_PORT,
};
use shared::domain::{LogicalKey, MotionCommand};
use tokio::net::UdpSocket;

#[derive(Parser, Debug)]
#[command(about = "Bench utilities for the robot command and telemetry links")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one command token to the robot.
    Send {
        token: String,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = DEFAULT_COMMAND_PORT)]
        port: u16,
    },
    /// Emit one raw telemetry datagram, e.g. `FREQ:12.5`.
    Emit {
        datagram: String,
        #[arg(long, default_value = "127.0.0.1:1001")]
        target: String,
    },
    /// Print the command a set of held keys resolves to.
    Resolve {
        /// Comma separated key names such as `W,D` or `UP,FASTER`.
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        #[arg(long)]
        last: Option<String>,
        #[arg(long, default_value_t = ResolverMode::TurnContinuation)]
        mode: ResolverMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Send { token, host, port } => {
            let command: MotionCommand = token.parse()?;
            let transport = UdpCommandTransport::bind(host, port)
                .await
                .context("failed to create command socket")?;
            transport.send(command).await?;
            println!("sent {command} to {}", transport.describe());
        }
        Command::Emit { datagram, target } => {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            let written = socket
                .send_to(datagram.as_bytes(), target.as_str())
                .await
                .with_context(|| format!("failed to send to {target}"))?;
            println!("emitted {written} bytes to {target}");
        }
        Command::Resolve { keys, last, mode } => {
            let held = keys
                .iter()
                .filter(|name| !name.trim().is_empty())
                .map(|name| {
                    LogicalKey::from_name(name).ok_or_else(|| anyhow!("unknown key {name:?}"))
                })
                .collect::<Result<HeldKeys>>()?;
            let last = last
                .map(|token| token.parse::<MotionCommand>())
                .transpose()?;
            println!("{}", resolve_command(&held, last, mode));
        }
    }

    Ok(())
}
