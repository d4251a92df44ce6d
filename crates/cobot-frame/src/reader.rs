use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::trace;

use crate::codec::{decode_header, validate_tail, Frame, HEADER};
use crate::error::{FrameError, FramingError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// One unit of input recovered from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A well-formed frame.
    Frame(Frame),
    /// A frame whose length or footer was invalid. `command` is the
    /// identifier byte as read, so the matching expectation can be failed.
    Malformed { command: u8, error: FramingError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning for two consecutive header bytes.
    Seeking,
    /// Header seen; need length + command.
    ReadingHeader,
    /// Need payload + footer.
    ReadingBody { command: u8, payload_len: usize },
}

/// Resynchronizing frame decoder.
///
/// Bytes that do not form a header marker are discarded silently. The two
/// bytes after a marker are always length and command, so a length of `FE`
/// (a 252-byte payload) reads back like any other. The flip side is that a
/// stray `FE` directly in front of a real frame is taken as the marker and
/// shifts it by one byte; that frame is lost and scanning resumes once the
/// declared body has been consumed.
///
/// Framing errors never fail the decoder: they are yielded as
/// [`Inbound::Malformed`] and scanning resumes after the broken frame.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    discarded: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Seeking,
            discarded: 0,
        }
    }

    /// Total number of noise bytes dropped while seeking a header.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Advance `src` past the next header marker. Returns `false` (keeping a
    /// trailing lone `FE`) when no complete marker is buffered yet.
    fn seek_header(&mut self, src: &mut BytesMut) -> bool {
        match src.windows(2).position(|pair| pair == [HEADER, HEADER]) {
            Some(pos) => {
                self.discard(src, pos);
                src.advance(2);
                true
            }
            None => {
                let keep = usize::from(src.last() == Some(&HEADER));
                self.discard(src, src.len() - keep);
                false
            }
        }
    }

    fn discard(&mut self, src: &mut BytesMut, count: usize) {
        if count > 0 {
            trace!(count, "discarding bytes while seeking header");
            self.discarded += count as u64;
            src.advance(count);
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameDecoder {
    type Item = Inbound;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        loop {
            match self.state {
                State::Seeking => {
                    if !self.seek_header(src) {
                        return Ok(None);
                    }
                    self.state = State::ReadingHeader;
                }
                State::ReadingHeader => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    let declared = src.get_u8();
                    let command = src.get_u8();
                    match decode_header([declared, command]) {
                        Ok((payload_len, command)) => {
                            self.state = State::ReadingBody {
                                command,
                                payload_len,
                            };
                        }
                        Err(error) => {
                            self.state = State::Seeking;
                            return Ok(Some(Inbound::Malformed { command, error }));
                        }
                    }
                }
                State::ReadingBody {
                    command,
                    payload_len,
                } => {
                    let need = payload_len + 1;
                    if src.len() < need {
                        src.reserve(need - src.len());
                        return Ok(None);
                    }
                    let payload = src.split_to(payload_len).freeze();
                    let tail = src.get_u8();
                    self.state = State::Seeking;

                    let inbound = match validate_tail(tail) {
                        Ok(()) => Inbound::Frame(Frame { command, payload }),
                        Err(error) => Inbound::Malformed { command, error },
                    };
                    return Ok(Some(inbound));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Inbound>> {
        if let Some(inbound) = self.decode(src)? {
            return Ok(Some(inbound));
        }
        if !src.is_empty() || self.state != State::Seeking {
            trace!(buffered = src.len(), state = ?self.state, "stream ended inside a frame");
        }
        src.clear();
        self.state = State::Seeking;
        Ok(None)
    }
}

/// Reads frames from any `AsyncRead` stream.
///
/// Handles partial reads and resynchronization internally; callers get
/// complete frames or per-frame framing errors.
pub struct FrameReader<R> {
    inner: FramedRead<R, FrameDecoder>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a new frame reader.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, INITIAL_BUFFER_CAPACITY)
    }

    /// Create a new frame reader with an explicit initial buffer size.
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            inner: FramedRead::with_capacity(inner, FrameDecoder::new(), capacity),
        }
    }

    /// Read the next frame or malformed-frame report.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// Cancel safe: dropping the future loses no buffered input.
    pub async fn read_event(&mut self) -> Result<Inbound> {
        match self.inner.next().await {
            Some(result) => result,
            None => Err(FrameError::ConnectionClosed),
        }
    }

    /// Read the next well-formed frame.
    ///
    /// Malformed frames are reported as `Err(FrameError::Framing(_))`; the
    /// reader stays usable afterwards.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        match self.read_event().await? {
            Inbound::Frame(frame) => Ok(frame),
            Inbound::Malformed { error, .. } => Err(error.into()),
        }
    }

    /// Total number of noise bytes dropped so far.
    pub fn discarded(&self) -> u64 {
        self.inner.decoder().discarded()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    /// Consume the reader and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}
