use std::time::Duration;

/// Default period between power queries while waiting for the controller.
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Default number of powered-off reports tolerated before giving up.
pub const DEFAULT_POWER_OFF_TOLERANCE: u32 = 10;

/// Default initial size of the reader loop's input buffer.
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 1024;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How often [`Client::wait_for_ready`](crate::Client::wait_for_ready)
    /// repeats the power query.
    pub ready_poll_interval: Duration,
    /// Powered-off reports accepted before `wait_for_ready` fails with
    /// [`ClientError::NotPoweredOn`](crate::ClientError::NotPoweredOn).
    /// Zero fails on the first one.
    pub power_off_tolerance: u32,
    /// Initial capacity of the input buffer.
    pub read_buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
            power_off_tolerance: DEFAULT_POWER_OFF_TOLERANCE,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
        }
    }
}
