use std::{fmt, num::ParseFloatError};

use shared::protocol::{UartPacketKind, UartStatus};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryTag {
    Freq,
    UartPkt,
    UartFail,
    Ir,
    Mag,
}

impl TelemetryTag {
    pub const ALL: [Self; 5] = [Self::Freq, Self::UartPkt, Self::UartFail, Self::Ir, Self::Mag];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Freq => "FREQ",
            Self::UartPkt => "UART_PKT",
            Self::UartFail => "UART_FAIL",
            Self::Ir => "IR",
            Self::Mag => "MAG",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for TelemetryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryReading {
    Frequency(f64),
    Uart(UartStatus),
    IrPulse(f64),
    MagnetDirection(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryParseError {
    #[error("datagram has no ':' delimiter")]
    MissingDelimiter,
    #[error("unknown telemetry tag '{0}'")]
    UnknownTag(String),
    #[error("{tag} payload '{payload}' is not a number: {source}")]
    InvalidNumber {
        tag: TelemetryTag,
        payload: String,
        #[source]
        source: ParseFloatError,
    },
}

/// Parses one `<TAG>:<payload>` line. UART payloads are kept verbatim; the
/// other tags are trimmed first.
pub fn parse_line(line: &str) -> Result<TelemetryReading, TelemetryParseError> {
    let (name, payload) = line
        .split_once(':')
        .ok_or(TelemetryParseError::MissingDelimiter)?;
    let tag = TelemetryTag::from_name(name)
        .ok_or_else(|| TelemetryParseError::UnknownTag(truncate(name, 32)))?;

    let reading = match tag {
        TelemetryTag::Freq => TelemetryReading::Frequency(parse_number(tag, payload)?),
        TelemetryTag::Ir => TelemetryReading::IrPulse(parse_number(tag, payload)?),
        TelemetryTag::UartPkt => TelemetryReading::Uart(UartStatus {
            kind: UartPacketKind::Pkt,
            payload: payload.to_string(),
        }),
        TelemetryTag::UartFail => TelemetryReading::Uart(UartStatus {
            kind: UartPacketKind::Fail,
            payload: payload.to_string(),
        }),
        TelemetryTag::Mag => TelemetryReading::MagnetDirection(payload.trim().to_string()),
    };
    Ok(reading)
}

/// Datagrams are decoded lossily; the robot firmware occasionally emits
/// stray bytes.
pub fn parse_datagram(bytes: &[u8]) -> Result<TelemetryReading, TelemetryParseError> {
    parse_line(&String::from_utf8_lossy(bytes))
}

fn parse_number(tag: TelemetryTag, payload: &str) -> Result<f64, TelemetryParseError> {
    let trimmed = payload.trim();
    trimmed
        .parse::<f64>()
        .map_err(|source| TelemetryParseError::InvalidNumber {
            tag,
            payload: truncate(trimmed, 32),
            source,
        })
}

fn truncate(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect()
}

#[cfg(test)]
#[path = "tests/parse_tests.rs"]
mod tests;
