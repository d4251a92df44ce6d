//! Waiting for the controller to come up.
//!
//! The Atom board only answers once it is powered, and an early query can
//! be lost while it boots. [`Client::wait_for_ready`] therefore keeps
//! re-sending the power query on a fixed period until a reply says the board
//! is on.

use cobot_frame::Command;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Reply to the power query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStatus {
    On,
    Off,
}

impl PowerStatus {
    /// Decode a power-query reply: first byte `0x01` means powered on.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload.first() {
            Some(0x01) => Ok(PowerStatus::On),
            Some(_) => Ok(PowerStatus::Off),
            None => Err(ClientError::InvalidResponse {
                command: Command::IsPowerOn,
                reason: "empty reply".to_string(),
            }),
        }
    }

    pub fn is_on(self) -> bool {
        self == PowerStatus::On
    }
}

impl Client {
    /// Query the power status once.
    pub async fn power_status(&self) -> Result<PowerStatus> {
        let reply = self.send_and_wait(Command::IsPowerOn, &[]).await?;
        PowerStatus::from_payload(&reply)
    }

    /// Whether the controller reports itself powered on.
    pub async fn is_powered_on(&self) -> Result<bool> {
        Ok(self.power_status().await?.is_on())
    }

    /// Wait until the controller reports that it is powered on.
    ///
    /// The power query is written every
    /// [`ready_poll_interval`](crate::ClientConfig::ready_poll_interval)
    /// until a powered-on reply arrives, and no further queries are written
    /// after that. Powered-off replies keep the wait going until more than
    /// [`power_off_tolerance`](crate::ClientConfig::power_off_tolerance) of
    /// them have been seen, at which point this fails with
    /// [`ClientError::NotPoweredOn`].
    ///
    /// There is no overall deadline; wrap the call in `tokio::time::timeout`
    /// if one is needed.
    pub async fn wait_for_ready(&self) -> Result<()> {
        let tolerance = self.config.power_off_tolerance;
        let mut off_reports = 0u32;

        let poller = self.poll_power_status();
        tokio::pin!(poller);

        loop {
            let response = self.pending.register(Command::IsPowerOn);
            let reply = tokio::select! {
                biased;

                reply = response.wait() => reply?,
                err = &mut poller => return Err(err),
            };

            match PowerStatus::from_payload(&reply)? {
                PowerStatus::On => {
                    debug!(off_reports, "controller is powered on");
                    return Ok(());
                }
                PowerStatus::Off => {
                    off_reports += 1;
                    if off_reports > tolerance {
                        debug!(off_reports, tolerance, "controller stayed powered off");
                        return Err(ClientError::NotPoweredOn);
                    }
                    debug!(off_reports, tolerance, "controller reports powered off");
                }
            }
        }
    }

    /// Write the power query on every tick. Completes only on write failure.
    async fn poll_power_status(&self) -> ClientError {
        let mut ticker = interval(self.config.ready_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sent = 0u64;
        loop {
            ticker.tick().await;
            if let Err(err) = self.writer.send(Command::IsPowerOn.id(), &[]).await {
                return err.into();
            }
            sent += 1;
            trace!(sent, "power query written");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_status_from_first_byte() {
        assert_eq!(PowerStatus::from_payload(&[0x01]).unwrap(), PowerStatus::On);
        assert_eq!(
            PowerStatus::from_payload(&[0x01, 0x00]).unwrap(),
            PowerStatus::On
        );
        assert_eq!(PowerStatus::from_payload(&[0x00]).unwrap(), PowerStatus::Off);
        assert_eq!(PowerStatus::from_payload(&[0x02]).unwrap(), PowerStatus::Off);
        assert!(matches!(
            PowerStatus::from_payload(&[]).unwrap_err(),
            ClientError::InvalidResponse {
                command: Command::IsPowerOn,
                ..
            }
        ));
    }
}
