//! padstream turns raw gamepad state snapshots into a discrete input event
//! stream: button press/release, stick and trigger movement and
//! movement-stop, and device connect/disconnect.

pub mod config;
pub mod tracker;

pub use tracker::{
    ButtonReading, ButtonType, DeviceRoster, DeviceSource, EventKind, GilrsSource,
    InputStateTracker, MappingKind, MoveValue, RawDeviceState, TrackerError, TrackerEvent,
    TrackerHandle, TrackerSettings,
};
