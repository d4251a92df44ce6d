/// A malformed frame. Local to the frame it was found in; the reader
/// resynchronizes and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    /// The frame does not start with two header markers.
    #[error("missing frame header (expected 0xFE 0xFE)")]
    MissingHeader,

    /// The byte after the payload is not the footer marker.
    #[error("invalid frame footer 0x{found:02X} (expected 0xFA)")]
    InvalidFooter { found: u8 },

    /// The length byte is too small to cover the length and command bytes.
    #[error("invalid frame length {declared} (minimum 2)")]
    InvalidLength { declared: u8 },
}

/// Errors that can occur during frame encoding, decoding and stream I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in the one-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A complete frame failed validation.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// The buffer ends before the frame does.
    #[error("incomplete frame ({have} of {need} bytes)")]
    Incomplete { have: usize, need: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
