//! Async client for myCobot robot arm controllers.
//!
//! The controller speaks a small binary protocol over a serial line or a TCP
//! bridge: `FE FE LEN CMD PAYLOAD FA`. Replies carry the command identifier
//! of the request they answer.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte streams to the controller (TCP, serial, in-memory)
//! - [`frame`]: frame codec, resynchronizing reader and serialized writer
//! - [`client`]: request/response client, power-on bootstrap and joint angles

/// Re-export transport types.
pub mod transport {
    pub use cobot_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cobot_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use cobot_client::*;
}

pub use cobot_client::{connect, Client, ClientConfig, ClientError, Command, JointAngles};
