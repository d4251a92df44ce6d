use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

/// Default buffer size of in-memory pipes (and of the serial bridge pipe).
pub const DEFAULT_DUPLEX_CAPACITY: usize = 4096;

/// A connected controller stream implementing `AsyncRead + AsyncWrite`.
///
/// This is the fundamental I/O type returned by transport operations.
/// Input and output share one duplex channel; use [`CobotStream::into_split`]
/// to obtain independent read and write endpoints.
///
/// Shutting the stream down is idempotent: once the write side has been
/// closed further `shutdown` calls succeed without touching the channel.
pub struct CobotStream {
    inner: CobotStreamInner,
    closed: bool,
}

enum CobotStreamInner {
    Tcp(TcpStream),
    Pipe(DuplexStream),
}

impl CobotStream {
    /// Wrap a connected TCP stream.
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: CobotStreamInner::Tcp(stream),
            closed: false,
        }
    }

    /// Wrap one end of an in-memory pipe.
    pub(crate) fn from_pipe(pipe: DuplexStream) -> Self {
        Self {
            inner: CobotStreamInner::Pipe(pipe),
            closed: false,
        }
    }

    /// Create a connected in-memory pair.
    ///
    /// Bytes written to one end are read from the other. Used by tests and
    /// by device simulators that stand in for a controller board.
    pub fn duplex(capacity: usize) -> (Self, Self) {
        let (left, right) = tokio::io::duplex(capacity);
        (Self::from_pipe(left), Self::from_pipe(right))
    }

    /// Split into independently owned read and write endpoints.
    pub fn into_split(self) -> (ReadHalf<Self>, WriteHalf<Self>) {
        tokio::io::split(self)
    }

    /// Short name of the underlying channel, for logs.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            CobotStreamInner::Tcp(_) => "tcp",
            CobotStreamInner::Pipe(_) => "pipe",
        }
    }

    /// Remote address, if the stream is a socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            CobotStreamInner::Tcp(stream) => stream.peer_addr().ok(),
            CobotStreamInner::Pipe(_) => None,
        }
    }
}

impl AsyncRead for CobotStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            CobotStreamInner::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            CobotStreamInner::Pipe(pipe) => Pin::new(pipe).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for CobotStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut self.get_mut().inner {
            CobotStreamInner::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            CobotStreamInner::Pipe(pipe) => Pin::new(pipe).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut self.get_mut().inner {
            CobotStreamInner::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            CobotStreamInner::Pipe(pipe) => Pin::new(pipe).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Ok(()));
        }
        let result = match &mut this.inner {
            CobotStreamInner::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            CobotStreamInner::Pipe(pipe) => Pin::new(pipe).poll_shutdown(cx),
        };
        if let Poll::Ready(Ok(())) = result {
            this.closed = true;
        }
        result
    }
}

impl std::fmt::Debug for CobotStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CobotStream")
            .field("type", &self.kind())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn duplex_pair_carries_bytes_both_ways() {
        let (mut left, mut right) = CobotStream::duplex(64);

        left.write_all(b"\xfe\xfe").await.unwrap();
        right.write_all(b"\xfa").await.unwrap();

        let mut buf = [0u8; 2];
        right.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0xFE, 0xFE]);

        let mut buf = [0u8; 1];
        left.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0xFA]);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_signals_eof() {
        let (mut left, mut right) = CobotStream::duplex(64);

        left.shutdown().await.unwrap();
        left.shutdown().await.unwrap();

        let mut buf = Vec::new();
        let read = right.read_to_end(&mut buf).await.unwrap();
        assert_eq!(read, 0);
    }

    #[tokio::test]
    async fn split_halves_work_independently() {
        let (left, mut right) = CobotStream::duplex(64);
        let (mut rx, mut tx) = left.into_split();

        tx.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        right.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        right.write_all(b"pong").await.unwrap();
        rx.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn debug_reports_kind() {
        let (left, _right) = CobotStream::duplex(8);
        assert_eq!(left.kind(), "pipe");
        assert!(left.peer_addr().is_none());
        assert!(format!("{left:?}").contains("pipe"));
    }
}
