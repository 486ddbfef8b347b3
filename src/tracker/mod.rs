//! Input tracking subsystem
//!
//! Turns raw, state-only device snapshots into a discrete event stream:
//!
//! 1. [`source`] - Device source capability and raw data model
//! 2. [`poller`] - Polling loop with per-control differencing and debouncing
//! 3. [`events`] - Typed event vocabulary and publish/subscribe bus
//! 4. [`tracker_handle`] - Poll task lifecycle and device queries
//!
//! # Architecture
//!
//! ```text
//! Device Source ──► Input State Tracker ──► Event Bus ──► Subscribers
//!                   (diff + debounce)       (Pressed/Released/Move/
//!                                            MoveStopped/Connected/
//!                                            Disconnected)
//! ```
//!
//! The tracker is passive between ticks; the poll task re-schedules itself
//! at the configured rate until stopped.

pub mod events;
pub mod gilrs_source;
pub mod poller;
pub mod source;
pub mod tracker_handle;

pub use events::{EventBus, EventKind, MoveValue, TrackerEvent};
pub use gilrs_source::GilrsSource;
pub use poller::{DeviceRoster, Idle, InputStateTracker, Polling, TrackerError, TrackerSettings};
pub use source::{ButtonReading, ButtonType, DeviceSource, MappingKind, RawDeviceState};
pub use tracker_handle::TrackerHandle;
