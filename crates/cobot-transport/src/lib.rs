//! Byte-stream transports for myCobot controllers.
//!
//! Provides a unified duplex stream over the ways a controller board is
//! reached:
//! - TCP sockets (the Wi-Fi/ethernet bridge on the arm, port 9000)
//! - Serial ports (USB-UART, behind the `serial` feature)
//! - In-memory pipes for tests and simulators
//!
//! This is the lowest layer. Everything else builds on top of the
//! [`CobotStream`] type provided here.

pub mod error;
#[cfg(feature = "serial")]
pub mod serial;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
#[cfg(feature = "serial")]
pub use serial::open_serial;
pub use stream::{CobotStream, DEFAULT_DUPLEX_CAPACITY};
pub use tcp::{connect_tcp, DEFAULT_TCP_PORT};

/// Baud rate the controller firmware uses out of the box.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
