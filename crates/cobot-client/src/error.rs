use std::time::Duration;

use cobot_frame::{Command, FramingError};

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport setup failed.
    #[error("transport error: {0}")]
    Transport(#[from] cobot_transport::TransportError),

    /// Frame-level error while writing.
    #[error("frame error: {0}")]
    Frame(#[from] cobot_frame::FrameError),

    /// The reply for this command arrived malformed.
    #[error("malformed reply to {command}: {source}")]
    Framing {
        command: Command,
        source: FramingError,
    },

    /// The controller answered the power query with "off".
    #[error("controller is not powered on")]
    NotPoweredOn,

    /// The reply decoded as a frame but its payload makes no sense.
    #[error("unexpected reply to {command}: {reason}")]
    InvalidResponse { command: Command, reason: String },

    /// A joint angle does not fit the wire encoding (±327.67°).
    #[error("angle {value} for joint {joint} is out of range")]
    AngleOutOfRange { joint: usize, value: f64 },

    /// The reader loop stopped before a reply arrived.
    #[error("connection closed while waiting for {0}")]
    Disconnected(Command),

    /// The expectation was cancelled by the caller.
    #[error("wait for {0} was cancelled")]
    Cancelled(Command),

    /// No reply within the caller's deadline.
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: Command, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, ClientError>;
