//! Serial port transport.
//!
//! `serialport` exposes a blocking handle. The port is bridged onto an
//! in-memory tokio pipe by two worker threads so the rest of the stack only
//! ever sees an async [`CobotStream`]:
//!
//! ```text
//! port ──(cobot-serial-rx)──► pipe ──► CobotStream (read)
//! port ◄──(cobot-serial-tx)── pipe ◄── CobotStream (write)
//! ```
//!
//! Both threads exit once the async side has been closed or dropped.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serialport::SerialPort;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::stream::{CobotStream, DEFAULT_DUPLEX_CAPACITY};

/// How long a blocking port read waits before re-checking for shutdown.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(50);

const CHUNK_SIZE: usize = 256;

/// Open a serial device and bridge it onto an async stream.
///
/// DTR and RTS are asserted on open, which the controller boards expect
/// before they start talking. Must be called from within a tokio runtime.
pub fn open_serial(path: impl AsRef<Path>, baud_rate: u32) -> Result<CobotStream> {
    let path = path.as_ref();
    let open_err = |source: std::io::Error| TransportError::Open {
        path: path.to_path_buf(),
        source,
    };

    let handle = Handle::try_current().map_err(|err| TransportError::NoRuntime(err.to_string()))?;

    let mut port = serialport::new(path.to_string_lossy().into_owned(), baud_rate)
        .timeout(PORT_READ_TIMEOUT)
        .open()
        .map_err(|err| open_err(err.into()))?;
    port.write_data_terminal_ready(true)
        .map_err(|err| open_err(err.into()))?;
    port.write_request_to_send(true)
        .map_err(|err| open_err(err.into()))?;
    let reader_port = port.try_clone().map_err(|err| open_err(err.into()))?;

    let (local, remote) = tokio::io::duplex(DEFAULT_DUPLEX_CAPACITY);
    let (remote_rx, remote_tx) = tokio::io::split(remote);
    let closed = Arc::new(AtomicBool::new(false));

    spawn_bridge_thread("cobot-serial-rx", {
        let handle = handle.clone();
        let closed = Arc::clone(&closed);
        move || port_to_pipe(reader_port, remote_tx, handle, closed)
    })
    .map_err(open_err)?;
    spawn_bridge_thread("cobot-serial-tx", move || {
        pipe_to_port(port, remote_rx, handle, closed)
    })
    .map_err(open_err)?;

    info!(path = %path.display(), baud_rate, "opened serial port");
    Ok(CobotStream::from_pipe(local))
}

fn spawn_bridge_thread<F>(name: &str, body: F) -> std::io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map(|_| ())
}

fn port_to_pipe(
    mut port: Box<dyn SerialPort>,
    mut pipe: WriteHalf<DuplexStream>,
    handle: Handle,
    closed: Arc<AtomicBool>,
) {
    let mut chunk = [0u8; CHUNK_SIZE];
    while !closed.load(Ordering::Acquire) {
        match port.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if handle.block_on(pipe.write_all(&chunk[..n])).is_err() {
                    break;
                }
            }
            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "serial read failed");
                break;
            }
        }
    }
    let _ = handle.block_on(pipe.shutdown());
    debug!("serial rx bridge stopped");
}

fn pipe_to_port(
    mut port: Box<dyn SerialPort>,
    mut pipe: ReadHalf<DuplexStream>,
    handle: Handle,
    closed: Arc<AtomicBool>,
) {
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = match handle.block_on(pipe.read(&mut chunk)) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        if let Err(err) = port.write_all(&chunk[..n]).and_then(|()| port.flush()) {
            warn!(error = %err, "serial write failed");
            break;
        }
    }
    closed.store(true, Ordering::Release);
    debug!("serial tx bridge stopped");
}
