//! Joint angles and the commands that read and write them.
//!
//! On the wire each angle is a big-endian `i16` holding the angle in
//! hundredths of a degree, so the representable range is ±327.67°.

use std::fmt;

use cobot_frame::Command;

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Number of joints on the arm.
pub const JOINT_COUNT: usize = 6;

/// Size of an encoded angle vector.
pub const ANGLES_PAYLOAD_LEN: usize = JOINT_COUNT * 2;

/// Default speed byte for angle moves.
pub const DEFAULT_SPEED: u8 = 50;

const SCALE: f64 = 100.0;

/// Six joint angles in degrees, joint 1 first.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JointAngles(pub [f64; JOINT_COUNT]);

impl JointAngles {
    pub fn new(angles: [f64; JOINT_COUNT]) -> Self {
        Self(angles)
    }

    pub fn as_array(&self) -> &[f64; JOINT_COUNT] {
        &self.0
    }

    pub fn as_mut_array(&mut self) -> &mut [f64; JOINT_COUNT] {
        &mut self.0
    }

    /// Encode as six big-endian hundredths of a degree.
    ///
    /// Values are rounded to the nearest hundredth. Joints are numbered
    /// from 1 in [`ClientError::AngleOutOfRange`].
    pub fn encode(&self) -> Result<[u8; ANGLES_PAYLOAD_LEN]> {
        let mut out = [0u8; ANGLES_PAYLOAD_LEN];
        for (index, (angle, chunk)) in self.0.iter().zip(out.chunks_exact_mut(2)).enumerate() {
            let scaled = (angle * SCALE).round();
            if !scaled.is_finite() || scaled < f64::from(i16::MIN) || scaled > f64::from(i16::MAX)
            {
                return Err(ClientError::AngleOutOfRange {
                    joint: index + 1,
                    value: *angle,
                });
            }
            chunk.copy_from_slice(&(scaled as i16).to_be_bytes());
        }
        Ok(out)
    }

    /// Build the send-angles payload: the encoded angles followed by `speed`.
    pub fn to_payload(&self, speed: u8) -> Result<[u8; ANGLES_PAYLOAD_LEN + 1]> {
        let mut out = [0u8; ANGLES_PAYLOAD_LEN + 1];
        out[..ANGLES_PAYLOAD_LEN].copy_from_slice(&self.encode()?);
        out[ANGLES_PAYLOAD_LEN] = speed;
        Ok(out)
    }

    /// Decode a get-angles reply. Bytes past the first twelve are ignored.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < ANGLES_PAYLOAD_LEN {
            return Err(ClientError::InvalidResponse {
                command: Command::GetAngles,
                reason: format!(
                    "expected {ANGLES_PAYLOAD_LEN} bytes, got {}",
                    payload.len()
                ),
            });
        }
        let mut angles = [0.0; JOINT_COUNT];
        for (angle, chunk) in angles.iter_mut().zip(payload.chunks_exact(2)) {
            *angle = f64::from(i16::from_be_bytes([chunk[0], chunk[1]])) / SCALE;
        }
        Ok(Self(angles))
    }
}

impl From<[f64; JOINT_COUNT]> for JointAngles {
    fn from(angles: [f64; JOINT_COUNT]) -> Self {
        Self(angles)
    }
}

impl fmt::Display for JointAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, angle) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{angle:.2}")?;
        }
        f.write_str("]")
    }
}

impl Client {
    /// Read the current joint angles from the controller.
    pub async fn get_angles(&self) -> Result<JointAngles> {
        let reply = self.send_and_wait(Command::GetAngles, &[]).await?;
        JointAngles::from_payload(&reply)
    }

    /// Move all joints. The controller does not reply.
    pub async fn send_angles(&self, angles: &JointAngles, speed: u8) -> Result<()> {
        let payload = angles.to_payload(speed)?;
        self.send(Command::SendAngles, &payload).await
    }

    /// Refresh the client-held angles from the controller.
    pub async fn pull_angles(&mut self) -> Result<&JointAngles> {
        self.angles = self.get_angles().await?;
        Ok(&self.angles)
    }

    /// Send the client-held angles to the controller.
    pub async fn push_angles(&self, speed: u8) -> Result<()> {
        self.send_angles(&self.angles, speed).await
    }

    /// Last pulled (or locally edited) angles.
    pub fn angles(&self) -> &JointAngles {
        &self.angles
    }

    /// Edit the client-held angles ahead of [`Client::push_angles`].
    pub fn angles_mut(&mut self) -> &mut JointAngles {
        &mut self.angles
    }
}
