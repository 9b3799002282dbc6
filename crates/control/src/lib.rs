//! Turns held keys into motion commands and gets them to the robot.

pub mod error;
pub mod resolver;
pub mod session;
pub mod transport;

pub use error::TransportError;
pub use resolver::{
    apply_speed_modifier, resolve_command, resolve_direction, should_transmit, HeldKeys,
    ResolverMode,
};
pub use session::{ControlSession, Dispatch};
pub use transport::{
    CommandTransport, RecordingTransport, UdpCommandTransport, DEFAULT_COMMAND_PORT,
};
