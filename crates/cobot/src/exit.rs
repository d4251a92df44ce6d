use std::fmt;
use std::io;

use cobot_client::ClientError;
use cobot_frame::FrameError;
use cobot_transport::TransportError;

// Exit codes. 124 matches timeout(1); 130 is the shell convention for SIGINT.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const NOT_POWERED: i32 = 40;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Connect { ref source, .. } | TransportError::Open { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::NoRuntime(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::Framing(_) | FrameError::Incomplete { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Frame(err) => frame_error(context, err),
        ClientError::Framing { .. } | ClientError::InvalidResponse { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ClientError::AngleOutOfRange { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        ClientError::NotPoweredOn => CliError::new(NOT_POWERED, format!("{context}: {err}")),
        ClientError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ClientError::Disconnected(_) | ClientError::Cancelled(_) => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cobot_client::Command;

    use super::*;

    #[test]
    fn client_errors_map_to_exit_codes() {
        let cases = [
            (ClientError::NotPoweredOn, NOT_POWERED),
            (
                ClientError::Timeout {
                    command: Command::IsPowerOn,
                    timeout: Duration::from_secs(1),
                },
                TIMEOUT,
            ),
            (
                ClientError::AngleOutOfRange {
                    joint: 2,
                    value: 500.0,
                },
                USAGE,
            ),
            (
                ClientError::InvalidResponse {
                    command: Command::GetAngles,
                    reason: "short".to_string(),
                },
                DATA_INVALID,
            ),
            (ClientError::Disconnected(Command::GetAngles), FAILURE),
        ];
        for (err, code) in cases {
            assert_eq!(client_error("ctx", err).code, code);
        }
    }

    #[test]
    fn connect_refused_is_transport_error() {
        let err = TransportError::Connect {
            addr: "127.0.0.1:9000".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        let cli = transport_error("connect failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("connect failed: "));
    }

    #[test]
    fn malformed_frames_are_invalid_data() {
        let err = FrameError::Framing(cobot_frame::FramingError::MissingHeader);
        assert_eq!(frame_error("decode failed", err).code, DATA_INVALID);
    }

    #[test]
    fn serial_permission_denied() {
        let err = TransportError::Open {
            path: "/dev/ttyUSB0".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open failed", err).code, PERMISSION_DENIED);
    }
}
