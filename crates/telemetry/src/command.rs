//! Outbound Vehicle Commands
//!
//! Wire format shared with the simulator's command channel:
//! `{"type": "HEAL", "value1": 1.0, "value2": 0.0}`

use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};

/// Command type tag on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    Drive,
    Heal,
    Fault,
}

impl CommandKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Drive => "DRIVE",
            CommandKind::Heal => "HEAL",
            CommandKind::Fault => "FAULT",
        }
    }
}

/// Command sent to the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Manual/remote driving input, never produced by the detection engine
    Drive { throttle: f64, steering: f64 },
    /// Activate the virtual sensor
    Heal { level: f64 },
    /// Inject (1.0) or clear (0.0) sensor faults
    Fault { level: f64 },
}

impl Command {
    /// Heal command emitted when healing starts
    pub fn heal() -> Self {
        Command::Heal { level: 1.0 }
    }

    /// Clears every active fault; doubles as the recovery acknowledgement
    pub fn clear_faults() -> Self {
        Command::Fault { level: 0.0 }
    }

    /// Diagnostic signal-loss injection
    pub fn inject_fault() -> Self {
        Command::Fault { level: 1.0 }
    }

    /// Wire type tag
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Drive { .. } => CommandKind::Drive,
            Command::Heal { .. } => CommandKind::Heal,
            Command::Fault { .. } => CommandKind::Fault,
        }
    }

    /// Convert to the wire packet
    pub fn to_packet(&self) -> CommandPacket {
        let (value1, value2) = match *self {
            Command::Drive { throttle, steering } => (throttle, steering),
            Command::Heal { level } => (level, 0.0),
            Command::Fault { level } => (level, 0.0),
        };
        CommandPacket {
            kind: self.kind(),
            value1,
            value2,
        }
    }

    /// Serialize to JSON bytes
    pub fn encode(&self) -> Result<Vec<u8>, TelemetryError> {
        serde_json::to_vec(&self.to_packet()).map_err(|e| TelemetryError::Encoding(e.to_string()))
    }

    /// Parse from JSON bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, TelemetryError> {
        let packet: CommandPacket = serde_json::from_slice(bytes)?;
        Ok(packet.into())
    }
}

/// Command as it travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandPacket {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub value1: f64,
    #[serde(default)]
    pub value2: f64,
}

impl From<CommandPacket> for Command {
    fn from(packet: CommandPacket) -> Self {
        match packet.kind {
            CommandKind::Drive => Command::Drive {
                throttle: packet.value1,
                steering: packet.value2,
            },
            CommandKind::Heal => Command::Heal { level: packet.value1 },
            CommandKind::Fault => Command::Fault { level: packet.value1 },
        }
    }
}
