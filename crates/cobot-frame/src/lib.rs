//! Frame codec for the myCobot controller protocol.
//!
//! Every message on the wire is framed as:
//! - A 2-byte header (`FE FE`) for stream synchronization
//! - A 1-byte length (payload length + 2)
//! - A 1-byte command identifier
//! - The payload
//! - A 1-byte footer (`FA`)
//!
//! The reader resynchronizes on noise by scanning for the header; callers
//! only ever see complete frames or per-frame framing errors.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_header, encode_frame, validate_tail, Frame, FOOTER, HEADER,
    MAX_PAYLOAD, OVERHEAD,
};
pub use command::{command_name, Command};
pub use error::{FrameError, FramingError, Result};
pub use reader::{FrameDecoder, FrameReader, Inbound};
pub use writer::{FrameEncoder, FrameWriter};
