//! Command identifiers.
//!
//! A command byte is both the tag of an outbound request and the tag of the
//! inbound response it correlates with.

use std::fmt;

/// Known controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Query whether the Atom board is powered on. Reply: 1 byte, `1` = on.
    IsPowerOn = 0x12,
    /// Read the six joint angles. Reply: 6 × i16 BE (degrees × 100).
    GetAngles = 0x20,
    /// Move all joints. Payload: 6 × i16 BE (degrees × 100) + speed byte.
    SendAngles = 0x22,
    /// Read the end effector coordinates.
    GetCoords = 0x23,
    /// Move the end effector.
    SendCoords = 0x25,
    /// Query whether the arm is still moving.
    IsMoving = 0x2B,
}

impl Command {
    /// Every known command, in identifier order.
    pub const ALL: [Command; 6] = [
        Command::IsPowerOn,
        Command::GetAngles,
        Command::SendAngles,
        Command::GetCoords,
        Command::SendCoords,
        Command::IsMoving,
    ];

    /// The wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a command by wire identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    /// Kebab-case name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Command::IsPowerOn => "is-power-on",
            Command::GetAngles => "get-angles",
            Command::SendAngles => "send-angles",
            Command::GetCoords => "get-coords",
            Command::SendCoords => "send-coords",
            Command::IsMoving => "is-moving",
        }
    }

    /// Look up a command by its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.id()
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(id)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.id())
    }
}

/// Human-readable name for any command byte seen on the wire.
pub fn command_name(id: u8) -> &'static str {
    Command::from_id(id).map_or("unknown", Command::name)
}
