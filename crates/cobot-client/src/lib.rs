//! Request/response client for myCobot controllers.
//!
//! This is the "just works" layer. Connect to a controller, send framed
//! commands, and await the reply carrying the same command identifier. A
//! background reader loop decodes inbound frames and completes the matching
//! expectation; concurrent requests for one identifier share a single reply.

pub mod angles;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod pending;

pub use angles::{JointAngles, ANGLES_PAYLOAD_LEN, DEFAULT_SPEED, JOINT_COUNT};
pub use bootstrap::PowerStatus;
pub use client::Client;
pub use config::{
    ClientConfig, DEFAULT_POWER_OFF_TOLERANCE, DEFAULT_READ_BUFFER_CAPACITY,
    DEFAULT_READY_POLL_INTERVAL,
};
#[cfg(feature = "serial")]
pub use connector::{open_serial, open_serial_with_config};
pub use connector::{connect, connect_with_config};
pub use error::{ClientError, Result};
pub use pending::{PendingResponse, PendingTable};

pub use cobot_frame::Command;
