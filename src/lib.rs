//! Beat-driven haptics: turns a live spectrum stream into motor intensity.

pub mod actuator;
pub mod beat;
pub mod config;
pub mod error;
pub mod motor;
pub mod session;
pub mod source;
pub mod types;

pub use actuator::{Actuator, DeviceFileActuator, LogActuator, NoActuator};
pub use beat::{Beat, BeatDetector};
pub use config::{BeatConfig, Config};
pub use error::{Error, Result};
pub use motor::{MotorPhase, MotorState};
pub use session::Session;
pub use source::{ChannelSource, SpectrumSource};
pub use types::Snapshot;
