use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors that can occur while setting up a controller transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the controller's TCP endpoint.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The address did not resolve to any socket address.
    #[error("address {0} did not resolve")]
    Unresolved(String),

    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bridge that needs a tokio runtime was created outside of one.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}

impl TransportError {
    pub(crate) fn connect(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Connect {
            addr: addr.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
