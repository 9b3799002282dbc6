use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::MotionCommand;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAccepted {
    pub command: MotionCommand,
    pub transmitted: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UartPacketKind {
    Pkt,
    Fail,
}

impl UartPacketKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pkt => "PKT",
            Self::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartStatus {
    pub kind: UartPacketKind,
    pub payload: String,
}

/// Latest known value of every telemetry channel reported by the robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frequency_hz: Option<f64>,
    pub uart: Option<UartStatus>,
    pub ir_pulse: Option<f64>,
    pub magnet_direction: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One server-sent event pushed to dashboard subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Frequency {
        value: Option<String>,
    },
    UartData {
        packet_type: Option<UartPacketKind>,
        value: Option<String>,
    },
    IrPulse {
        value: Option<String>,
    },
    MagnetDirection {
        value: Option<String>,
    },
}

impl TelemetrySnapshot {
    pub fn frequency_event(&self) -> TelemetryEvent {
        TelemetryEvent::Frequency {
            value: self.frequency_hz.map(format_reading),
        }
    }

    pub fn uart_event(&self) -> TelemetryEvent {
        TelemetryEvent::UartData {
            packet_type: self.uart.as_ref().map(|uart| uart.kind),
            value: self.uart.as_ref().map(|uart| uart.payload.clone()),
        }
    }

    pub fn ir_pulse_event(&self) -> TelemetryEvent {
        TelemetryEvent::IrPulse {
            value: self.ir_pulse.map(format_reading),
        }
    }

    pub fn magnet_event(&self) -> TelemetryEvent {
        TelemetryEvent::MagnetDirection {
            value: self.magnet_direction.clone(),
        }
    }

    /// Channel events in publish order.
    pub fn events(&self) -> [TelemetryEvent; 4] {
        [
            self.frequency_event(),
            self.uart_event(),
            self.ir_pulse_event(),
            self.magnet_event(),
        ]
    }
}

pub fn format_reading(value: f64) -> String {
    format!("{value:.2}")
}
