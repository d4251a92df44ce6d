#[cfg(feature = "serial")]
use std::path::Path;

use cobot_transport::connect_tcp;

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::Result;

/// Connect to a controller over TCP (`host` or `host:port`, default port
/// 9000) and start a client.
pub async fn connect(addr: &str) -> Result<Client> {
    connect_with_config(addr, ClientConfig::default()).await
}

/// Connect over TCP with explicit configuration.
pub async fn connect_with_config(addr: &str, config: ClientConfig) -> Result<Client> {
    let stream = connect_tcp(addr).await?;
    Client::with_config(stream, config)
}

/// Open a controller's serial port and start a client.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "serial")]
pub fn open_serial(path: impl AsRef<Path>, baud_rate: u32) -> Result<Client> {
    open_serial_with_config(path, baud_rate, ClientConfig::default())
}

/// Open a serial port with explicit configuration.
#[cfg(feature = "serial")]
pub fn open_serial_with_config(
    path: impl AsRef<Path>,
    baud_rate: u32,
    config: ClientConfig,
) -> Result<Client> {
    let stream = cobot_transport::open_serial(path, baud_rate)?;
    Client::with_config(stream, config)
}
