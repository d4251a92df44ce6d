use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::CobotStream;

/// Port the controller's socket server listens on unless told otherwise.
pub const DEFAULT_TCP_PORT: u16 = 9000;

/// Connect to a controller over TCP.
///
/// `addr` may be `host:port`, a bare host name or a bare IP address; the
/// latter two use [`DEFAULT_TCP_PORT`]. Every resolved address is tried in
/// order and the last failure is reported.
pub async fn connect_tcp(addr: &str) -> Result<CobotStream> {
    let target = with_default_port(addr);
    let candidates: Vec<SocketAddr> = tokio::net::lookup_host(&target)
        .await
        .map_err(|source| TransportError::Connect {
            addr: target.clone(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        match TcpStream::connect(candidate).await {
            Ok(stream) => {
                // Frames are a handful of bytes; don't let Nagle hold them back.
                stream.set_nodelay(true)?;
                info!(%candidate, "connected to controller");
                return Ok(CobotStream::from_tcp(stream));
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = Some(TransportError::connect(candidate, err));
            }
        }
    }

    Err(last_err.unwrap_or(TransportError::Unresolved(target)))
}

fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_TCP_PORT).to_string();
    }
    let has_port = addr
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
    if has_port {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_TCP_PORT}")
    }
}
