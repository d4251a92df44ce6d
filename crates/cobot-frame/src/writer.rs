use bytes::{Bytes, BytesMut};
use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;
use tokio_util::codec::{Encoder, FramedWrite};
use tracing::trace;

use crate::codec::{encode_frame, Frame, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Encodes [`Frame`]s into the wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameEncoder;

impl Encoder<Frame> for FrameEncoder {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(frame.command, &frame.payload, dst)
    }
}

/// Writes complete frames to any `AsyncWrite` stream.
///
/// Shared by reference between any number of tasks. A single writer lock
/// serializes `send` calls, so concurrent frames never interleave on the
/// wire; each frame is written in full and flushed before the lock is
/// released.
pub struct FrameWriter<W> {
    inner: Mutex<FramedWrite<W, FrameEncoder>>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Create a new frame writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(FramedWrite::new(inner, FrameEncoder)),
        }
    }

    /// Encode and send a payload under a command identifier, then flush.
    pub async fn send(&self, command: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        self.write_frame(Frame {
            command,
            payload: Bytes::copy_from_slice(payload),
        })
        .await
    }

    /// Write a complete frame, then flush.
    pub async fn write_frame(&self, frame: Frame) -> Result<()> {
        let command = frame.command;
        let len = frame.payload.len();
        let mut sink = self.inner.lock().await;
        sink.send(frame).await?;
        trace!(command, len, "frame written");
        Ok(())
    }

    /// Flush pending bytes and close the output endpoint.
    ///
    /// Safe to call more than once if the underlying stream's shutdown is.
    pub async fn shutdown(&self) -> Result<()> {
        let mut sink = self.inner.lock().await;
        SinkExt::<Frame>::close(&mut *sink).await
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().into_inner()
    }
}
