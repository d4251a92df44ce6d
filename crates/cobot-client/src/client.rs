use std::time::Duration;

use bytes::Bytes;
use cobot_frame::{command_name, Command, FrameError, FrameReader, FrameWriter, Inbound};
use cobot_transport::{CobotStream, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::angles::JointAngles;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::pending::PendingTable;

pub(crate) type BoxedOutput = Box<dyn AsyncWrite + Send + Unpin>;

/// A connected controller client.
///
/// Owns the background reader loop and the single frame writer. All request
/// methods take `&self`, so one client can be shared (for example behind an
/// `Arc`) by any number of tasks. Replies are correlated by command
/// identifier only: concurrent requests for the same command share one
/// reply.
///
/// Dropping the client cancels the reader loop; use [`Client::shutdown`] to
/// also close the output endpoint gracefully.
pub struct Client {
    pub(crate) writer: FrameWriter<BoxedOutput>,
    pub(crate) pending: PendingTable,
    pub(crate) config: ClientConfig,
    pub(crate) angles: JointAngles,
    cancel: CancellationToken,
    reader_task: Option<JoinHandle<std::result::Result<(), FrameError>>>,
}

impl Client {
    /// Start a client over a connected stream with the default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(stream: CobotStream) -> Result<Self> {
        Self::with_config(stream, ClientConfig::default())
    }

    /// Start a client over a connected stream.
    pub fn with_config(stream: CobotStream, config: ClientConfig) -> Result<Self> {
        debug!(
            transport = stream.kind(),
            peer = ?stream.peer_addr(),
            "starting client"
        );
        let (input, output) = stream.into_split();
        Self::from_parts(input, output, config)
    }

    /// Start a client over separate input and output endpoints.
    pub fn from_parts<R, W>(input: R, output: W, config: ClientConfig) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| TransportError::NoRuntime(err.to_string()))?;

        let pending = PendingTable::new();
        let cancel = CancellationToken::new();
        let reader = FrameReader::with_capacity(input, config.read_buffer_capacity);
        let reader_task = runtime.spawn(read_loop(reader, pending.clone(), cancel.clone()));

        Ok(Self {
            writer: FrameWriter::new(Box::new(output) as BoxedOutput),
            pending,
            config,
            angles: JointAngles::default(),
            cancel,
            reader_task: Some(reader_task),
        })
    }

    /// The configuration this client was started with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Write one frame without expecting a reply.
    pub async fn send(&self, command: Command, payload: &[u8]) -> Result<()> {
        self.writer.send(command.id(), payload).await?;
        Ok(())
    }

    /// Write one frame and wait for the reply carrying the same identifier.
    ///
    /// The expectation is registered before the frame is written, so a fast
    /// reply can never slip past it. If another caller is already waiting on
    /// `command`, both observe the same reply. There is no deadline; see
    /// [`Client::send_and_wait_timeout`].
    pub async fn send_and_wait(&self, command: Command, payload: &[u8]) -> Result<Bytes> {
        let response = self.pending.register(command);
        self.writer.send(command.id(), payload).await?;
        response.wait().await
    }

    /// [`Client::send_and_wait`] bounded by `timeout`.
    ///
    /// On expiry this caller's interest is dropped; other callers waiting on
    /// the same command keep waiting.
    pub async fn send_and_wait_timeout(
        &self,
        command: Command,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Bytes> {
        tokio::time::timeout(timeout, self.send_and_wait(command, payload))
            .await
            .map_err(|_| ClientError::Timeout { command, timeout })?
    }

    /// Abandon every wait on `command`. Waiters observe
    /// [`ClientError::Cancelled`]. Returns `false` if nobody was waiting.
    pub fn cancel_pending(&self, command: Command) -> bool {
        self.pending.cancel(command)
    }

    /// Number of command identifiers that still have a caller waiting.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether the reader loop is still running.
    pub fn is_connected(&self) -> bool {
        !self.pending.is_closed()
            && self
                .reader_task
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    /// Stop the reader loop, wait for it, then close the output endpoint.
    ///
    /// Outstanding waiters observe [`ClientError::Disconnected`].
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.reader_task.take() {
            match task.await {
                Ok(Ok(())) | Ok(Err(FrameError::ConnectionClosed)) => {}
                Ok(Err(err)) => debug!(error = %err, "reader loop had already failed"),
                Err(err) => warn!(error = %err, "reader task did not complete"),
            }
        }
        self.writer.shutdown().await?;
        debug!("client shut down");
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("angles", &self.angles)
            .field("pending", &self.pending.len())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Reader loop: decode inbound frames for the lifetime of the connection and
/// complete the matching expectations.
///
/// Returns `Ok(())` when cancelled, otherwise the error that ended the
/// stream. Every expectation left in the table is failed on the way out.
async fn read_loop<R: AsyncRead + Unpin>(
    mut reader: FrameReader<R>,
    pending: PendingTable,
    cancel: CancellationToken,
) -> std::result::Result<(), FrameError> {
    debug!("reader loop started");
    let outcome = loop {
        let event = tokio::select! {
            biased;

            _ = cancel.cancelled() => break Ok(()),
            event = reader.read_event() => event,
        };

        match event {
            Ok(Inbound::Frame(frame)) => {
                let command = frame.command;
                let len = frame.payload.len();
                if pending.resolve(command, frame.payload) {
                    trace!(command = command_name(command), id = command, len, "reply delivered");
                } else {
                    debug!(
                        command = command_name(command),
                        id = command,
                        len,
                        "dropping frame nobody is waiting for"
                    );
                }
            }
            Ok(Inbound::Malformed { command, error }) => {
                let failed = pending.fail(command, error);
                warn!(
                    command = command_name(command),
                    id = command,
                    error = %error,
                    failed,
                    "malformed frame"
                );
            }
            Err(err) => break Err(err),
        }
    };

    let failed = pending.fail_all();
    match &outcome {
        Ok(()) => debug!(failed, discarded = reader.discarded(), "reader loop cancelled"),
        Err(FrameError::ConnectionClosed) => {
            debug!(failed, discarded = reader.discarded(), "connection closed by peer")
        }
        Err(err) => warn!(error = %err, failed, "reader loop stopped"),
    }
    outcome
}
