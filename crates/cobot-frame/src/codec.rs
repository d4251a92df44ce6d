use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, FramingError, Result};

/// Header marker, repeated twice at the start of every frame.
pub const HEADER: u8 = 0xFE;

/// Footer marker closing every frame.
pub const FOOTER: u8 = 0xFA;

/// Bytes a frame adds around its payload: header (2) + length (1) +
/// command (1) + footer (1).
pub const OVERHEAD: usize = 5;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 2;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The command identifier byte.
    pub command: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command: impl Into<u8>, payload: impl Into<Bytes>) -> Self {
        Self {
            command: command.into(),
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        OVERHEAD + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬────────┬─────────┬───────────┬────────┐
/// │ Header    │ Length │ Command │ Payload   │ Footer │
/// │ 0xFE 0xFE │ N + 2  │ (1B)    │ (N bytes) │ 0xFA   │
/// └───────────┴────────┴─────────┴───────────┴────────┘
/// ```
///
/// The length byte counts itself and the command byte, not the markers.
pub fn encode_frame(command: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(OVERHEAD + payload.len());
    dst.put_u8(HEADER);
    dst.put_u8(HEADER);
    dst.put_u8((payload.len() + 2) as u8);
    dst.put_u8(command);
    dst.put_slice(payload);
    dst.put_u8(FOOTER);
    Ok(())
}

/// Decode the two bytes that follow the header marker.
///
/// Returns `(payload_len, command)`.
pub fn decode_header(bytes: [u8; 2]) -> std::result::Result<(usize, u8), FramingError> {
    let [declared, command] = bytes;
    let payload_len = declared
        .checked_sub(2)
        .ok_or(FramingError::InvalidLength { declared })?;
    Ok((payload_len as usize, command))
}

/// Check the byte that follows the payload.
pub fn validate_tail(byte: u8) -> std::result::Result<(), FramingError> {
    if byte == FOOTER {
        Ok(())
    } else {
        Err(FramingError::InvalidFooter { found: byte })
    }
}

/// Decode one complete frame from the start of `src`.
///
/// Unlike the stream reader this does not scan for the header: `src` must
/// begin with it. Trailing bytes after the footer are ignored.
pub fn decode_frame(src: &[u8]) -> Result<Frame> {
    if src.len() < OVERHEAD {
        return Err(FrameError::Incomplete {
            have: src.len(),
            need: OVERHEAD,
        });
    }
    if src[0] != HEADER || src[1] != HEADER {
        return Err(FramingError::MissingHeader.into());
    }

    let (payload_len, command) = decode_header([src[2], src[3]])?;
    let need = OVERHEAD + payload_len;
    if src.len() < need {
        return Err(FrameError::Incomplete {
            have: src.len(),
            need,
        });
    }
    validate_tail(src[need - 1])?;

    Ok(Frame {
        command,
        payload: Bytes::copy_from_slice(&src[4..4 + payload_len]),
    })
}
