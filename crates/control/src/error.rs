use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("robot address '{target}' could not be resolved: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("robot address '{target}' resolved to no usable address")]
    NoAddress { target: String },
    #[error("failed to send '{token}' to {target}: {source}")]
    Send {
        token: String,
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("transport is offline: {0}")]
    Offline(String),
}
