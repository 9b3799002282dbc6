use std::io::{self, Write};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use shared::{domain::MotionCommand, protocol::TelemetryEvent};

/// What the single status line currently shows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub command: Option<MotionCommand>,
    pub frequency: Option<String>,
    pub ir_pulse: Option<String>,
    pub magnet: Option<String>,
    pub uart: Option<String>,
    pub error: Option<String>,
}

impl StatusView {
    pub fn absorb(&mut self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::Frequency { value } => self.frequency = value,
            TelemetryEvent::IrPulse { value } => self.ir_pulse = value,
            TelemetryEvent::MagnetDirection { value } => self.magnet = value,
            TelemetryEvent::UartData { packet_type, value } => {
                self.uart = packet_type
                    .map(|kind| format!("{} {}", kind.as_str(), value.unwrap_or_default()))
            }
        }
    }

    pub fn render(&self) -> String {
        let mut line = match self.command {
            Some(command) => format!("Sent Command: '{command}'"),
            None => "Sent Command: -".to_string(),
        };
        if let Some(error) = &self.error {
            line.push_str(&format!(" | Error: {error}"));
        }
        if let Some(hz) = &self.frequency {
            line.push_str(&format!(" | Frequency: {hz} Hz"));
        }
        if let Some(ir) = &self.ir_pulse {
            line.push_str(&format!(" | IR: {ir}"));
        }
        if let Some(magnet) = &self.magnet {
            line.push_str(&format!(" | MAG: {magnet}"));
        }
        if let Some(uart) = &self.uart {
            line.push_str(&format!(" | UART: {uart}"));
        }
        line
    }
}

/// Redraws one terminal line in place.
pub fn redraw(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    queue!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    stdout.flush()
}
