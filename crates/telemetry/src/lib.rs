pub mod listener;
pub mod parse;
pub mod publisher;
pub mod store;

pub use listener::{TelemetryListener, DEFAULT_TELEMETRY_BIND};
pub use parse::{parse_datagram, parse_line, TelemetryParseError, TelemetryReading, TelemetryTag};
pub use publisher::{spawn_subscriber, TelemetryCursor, PUBLISH_INTERVAL};
pub use store::TelemetryStore;
