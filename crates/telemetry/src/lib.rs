//! Vehicle Telemetry Model
//!
//! Samples, detector verdicts, outbound commands, and the JSON wire codec
//! spoken by the vehicle simulator.

mod command;
mod error;
mod sample;
mod verdict;
mod window;
mod wire;

pub use command::{Command, CommandKind, CommandPacket};
pub use error::TelemetryError;
pub use sample::{Position, TelemetrySample};
pub use verdict::{FaultReason, RuleKind, Verdict};
pub use window::SlidingWindow;
pub use wire::{PacketDecoder, POSITION_LOCK_DISTANCE};

/// Default UDP ports used by the simulator
pub mod ports {
    /// Telemetry stream (simulator -> engine)
    pub const TELEMETRY: u16 = 5005;
    /// Command channel (engine -> simulator)
    pub const COMMAND: u16 = 5006;
}
