use serde::{Deserialize, Serialize};
use statum::{machine, state};
use tracing::{debug, info, trace, warn};

use crate::tracker::events::{EventBus, EventKind, MoveValue, TrackerEvent};
use crate::tracker::source::{ButtonReading, ButtonType, DeviceSource, MappingKind, RawDeviceState};

// Tracker settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Stick readings within ±this value count as centered.
    pub stick_deadzone: f32,
    /// Trigger readings at or below this value count as released.
    pub trigger_deadzone: f32,
    /// Target tick rate of the poll loop.
    pub polls_per_second: u32,
    /// Consecutive centered ticks required before a stick is declared stopped.
    pub stop_iteration_threshold: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            stick_deadzone: 0.15,
            trigger_deadzone: 0.05,
            polls_per_second: 60,
            stop_iteration_threshold: 5,
        }
    }
}

// Tracker errors
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The platform exposes no way to enumerate input devices. Surfaced by
    /// `start()`; polling never begins.
    #[error("gamepad enumeration is not available on this platform: {0}")]
    UnsupportedPlatform(String),

    /// A slot's data is inconsistent with its stored history. Recovered
    /// locally by skipping the slot for the tick; never escapes the tick
    /// boundary.
    #[error("malformed state in device slot {slot}: {reason}")]
    MalformedDeviceState { slot: usize, reason: String },
}

/// Active device list plus the global ready flag, as of the last tick.
#[derive(Clone, Debug, Default)]
pub struct DeviceRoster {
    pub devices: Vec<RawDeviceState>,
    pub ready: bool,
}

// Define tracker lifecycle states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum TrackerPhase {
    Idle,
    Polling,
}

#[machine]
pub struct InputStateTracker<S: TrackerPhase> {
    // Device source capability
    source: Box<dyn DeviceSource + Send>,

    // Tracker settings
    settings: TrackerSettings,

    // Event subscribers
    bus: EventBus,

    // Active standard-mapping devices with their raw slot index
    active: Vec<(usize, RawDeviceState)>,

    // Connected flag per raw slot, holes preserved
    prev_connected: Vec<bool>,

    // Last-seen button state per raw slot; None until the first observation
    // after the slot's most recent connection
    prev_buttons: Vec<Option<Vec<ButtonReading>>>,

    // Last-seen axis state per raw slot, same lifecycle as prev_buttons
    prev_axes: Vec<Option<Vec<f32>>>,

    // Consecutive centered ticks per axis-pair start index
    stop_counts: Vec<u32>,

    // True once any connected device has produced a qualifying event
    ready: bool,

    // Set on connect; promoted to `ready` at the start of the next tick
    ready_pending: bool,
}

// Implementation of methods available in all states
impl<S: TrackerPhase> InputStateTracker<S> {
    /// Register an inline handler for one event kind.
    ///
    /// Handlers run synchronously inside the tick and must not block.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&TrackerEvent) + Send + 'static,
    {
        self.bus.subscribe(kind, handler);
    }

    /// Bridge one event kind into an mpsc channel for async consumers.
    pub fn subscribe_channel(
        &mut self,
        kind: EventKind,
        capacity: usize,
    ) -> tokio::sync::mpsc::Receiver<TrackerEvent> {
        self.bus.subscribe_channel(kind, capacity)
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: TrackerSettings) {
        self.settings = settings;
    }

    /// Number of currently active (standard-mapping) devices.
    pub fn num_devices(&self) -> usize {
        self.active.len()
    }

    /// Latest snapshot of the active device at `index`, if any.
    pub fn device_at(&self, index: usize) -> Option<&RawDeviceState> {
        self.active.get(index).map(|(_, state)| state)
    }

    pub fn roster(&self) -> DeviceRoster {
        DeviceRoster {
            devices: self.active.iter().map(|(_, state)| state.clone()).collect(),
            ready: self.ready,
        }
    }
}

// Implementation for Idle state
impl InputStateTracker<Idle> {
    pub fn create(source: Box<dyn DeviceSource + Send>, settings: Option<TrackerSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating input state tracker with settings: {:?}", settings);

        Self::new(
            source,
            settings,
            EventBus::new(),
            Vec::new(),  // active
            Vec::new(),  // prev_connected
            Vec::new(),  // prev_buttons
            Vec::new(),  // prev_axes
            Vec::new(),  // stop_counts
            false,       // ready
            false,       // ready_pending
        )
    }

    /// Verify the device source and transition to the Polling state.
    pub fn start(self) -> Result<InputStateTracker<Polling>, TrackerError> {
        if !self.source.is_available() {
            return Err(TrackerError::UnsupportedPlatform(
                "device source reports no enumeration capability".to_string(),
            ));
        }

        info!(
            "Starting input tracking at {} polls/sec (stick deadzone {}, trigger deadzone {})",
            self.settings.polls_per_second,
            self.settings.stick_deadzone,
            self.settings.trigger_deadzone
        );
        Ok(self.transition())
    }
}

// Implementation for Polling state
impl InputStateTracker<Polling> {
    /// Run one poll cycle: refresh the device list, then diff every active
    /// device against its stored state.
    ///
    /// Faults discovered here are logged and recovered; nothing escapes the
    /// tick boundary.
    pub fn tick(&mut self) {
        // Ready was requested by a connect on a previous tick; promote it now
        // so the freshly connected device gets its warm-up snapshot this tick.
        if self.ready_pending {
            self.ready = true;
            self.ready_pending = false;
            debug!("Device readiness promoted, event emission enabled");
        }

        let raw = self.source.snapshot();
        self.refresh_devices(raw);

        if !self.ready {
            return;
        }

        for index in 0..self.active.len() {
            let (slot, state) = self.active[index].clone();
            if let Err(fault) = self.diff_slot(slot, &state) {
                warn!("{}; skipping slot for this tick", fault);
                // Drop the slot's history so the next tick re-runs warm-up.
                self.prev_buttons[slot] = None;
                self.prev_axes[slot] = None;
            }
        }
    }

    /// Stop polling and return to the Idle state. Stored per-device history
    /// is kept, matching a plain pause/resume cycle.
    pub fn stop(self) -> InputStateTracker<Idle> {
        info!("Input tracking stopped");
        self.transition()
    }

    /// Compare the fresh slot list against the previous one and emit
    /// connect/disconnect events.
    fn refresh_devices(&mut self, raw: Vec<Option<RawDeviceState>>) {
        // A shorter snapshot than before disconnects the trailing slots, so
        // walk the union of both lists.
        let span = raw.len().max(self.prev_connected.len());
        if self.prev_connected.len() < span {
            self.prev_connected.resize(span, false);
            self.prev_buttons.resize_with(span, || None);
            self.prev_axes.resize_with(span, || None);
        }

        self.active.clear();

        for slot in 0..span {
            let entry = raw.get(slot).and_then(Option::as_ref);

            if self.prev_connected[slot] && entry.is_none() {
                self.prev_connected[slot] = false;
                self.prev_buttons[slot] = None;
                self.prev_axes[slot] = None;
                // The global ready gate stays up as long as any other slot
                // is still connected.
                self.ready = self.prev_connected.iter().any(|&connected| connected);
                info!("Device disconnected from slot {}", slot);
                self.bus.publish(&TrackerEvent::Disconnected { device: slot });
            }

            let Some(state) = entry else { continue };

            if state.mapping != MappingKind::Standard {
                trace!(
                    "Ignoring device '{}' in slot {}: non-standard mapping",
                    state.name,
                    slot
                );
                continue;
            }

            self.active.push((slot, state.clone()));

            if state.connected != self.prev_connected[slot] {
                self.prev_connected[slot] = state.connected;
                info!("Device '{}' connected in slot {}", state.name, slot);
                self.bus.publish(&TrackerEvent::Connected {
                    device: slot,
                    state: state.clone(),
                });
                // Most platforms only trust a new device's readings after a
                // user-initiated signal; hold event emission for one tick.
                self.ready_pending = true;
            }
        }
    }

    fn diff_slot(&mut self, slot: usize, state: &RawDeviceState) -> Result<(), TrackerError> {
        self.diff_buttons(slot, &state.buttons)?;
        self.diff_axes(slot, &state.axes)
    }

    /// Emit press/release events for digital buttons and move/stop events
    /// for the analog triggers.
    fn diff_buttons(&mut self, slot: usize, buttons: &[ButtonReading]) -> Result<(), TrackerError> {
        let entry = &mut self.prev_buttons[slot];
        let Some(prev) = entry.as_mut() else {
            // First observation since connecting: snapshot only, no events.
            debug!("Captured initial button state for slot {}", slot);
            *entry = Some(buttons.to_vec());
            return Ok(());
        };

        if prev.len() != buttons.len() {
            return Err(TrackerError::MalformedDeviceState {
                slot,
                reason: format!(
                    "button count changed from {} to {}",
                    prev.len(),
                    buttons.len()
                ),
            });
        }

        let trigger_deadzone = self.settings.trigger_deadzone;

        for (button_id, reading) in buttons.iter().enumerate() {
            // Triggers act as sticks: emit move events instead of press/release.
            if button_id == ButtonType::LeftTrigger.index()
                || button_id == ButtonType::RightTrigger.index()
            {
                let value = round2(reading.value);
                let stored = &mut prev[button_id];

                if value > trigger_deadzone || stored.value > trigger_deadzone {
                    let event = if value > trigger_deadzone {
                        TrackerEvent::Move {
                            device: slot,
                            control: button_id,
                            value: MoveValue::Trigger(value),
                        }
                    } else {
                        TrackerEvent::MoveStopped {
                            device: slot,
                            control: button_id,
                            value: MoveValue::Trigger(value),
                        }
                    };
                    stored.value = value;
                    self.bus.publish(&event);
                }
            } else {
                let pressed = reading.pressed;
                if pressed || prev[button_id].pressed {
                    prev[button_id].pressed = pressed;
                    let event = if pressed {
                        TrackerEvent::Pressed {
                            device: slot,
                            button: button_id,
                        }
                    } else {
                        TrackerEvent::Released {
                            device: slot,
                            button: button_id,
                        }
                    };
                    self.bus.publish(&event);
                }
            }
        }

        Ok(())
    }

    /// Emit move/stop events for stick axis pairs.
    ///
    /// Sticks oscillate near zero from sensor jitter, so a stop is only
    /// declared after `stop_iteration_threshold` consecutive centered ticks.
    /// While a stick is genuinely moving its stored state is committed every
    /// tick, so move events always carry fresh coordinates.
    fn diff_axes(&mut self, slot: usize, axes: &[f32]) -> Result<(), TrackerError> {
        let entry = &mut self.prev_axes[slot];
        let Some(prev) = entry.as_mut() else {
            debug!("Captured initial axis state for slot {}", slot);
            *entry = Some(axes.to_vec());
            return Ok(());
        };

        if prev.len() != axes.len() {
            return Err(TrackerError::MalformedDeviceState {
                slot,
                reason: format!("axis count changed from {} to {}", prev.len(), axes.len()),
            });
        }

        if self.stop_counts.len() < axes.len() {
            self.stop_counts.resize(axes.len(), 0);
        }

        let deadzone = self.settings.stick_deadzone;
        let mut axis_id = 0;

        // Sticks are inherently 2-D: even index is x, odd is y. An unpaired
        // trailing axis is ignored.
        while axis_id + 1 < axes.len() {
            let x = round2(axes[axis_id]);
            let y = round2(axes[axis_id + 1]);
            let prev_x = prev[axis_id];
            let prev_y = prev[axis_id + 1];

            let engaged = x.abs() > deadzone
                || y.abs() > deadzone
                || prev_x.abs() > deadzone
                || prev_y.abs() > deadzone;

            // True rest state across both ticks: not even a stop event, since
            // nothing was ever moving.
            if engaged {
                let mut stopped = false;

                if x.abs() <= deadzone && y.abs() <= deadzone {
                    self.stop_counts[axis_id] += 1;
                    if self.stop_counts[axis_id] > self.settings.stop_iteration_threshold {
                        stopped = true;
                        self.stop_counts[axis_id] = 0;
                        prev[axis_id] = x;
                        prev[axis_id + 1] = y;
                    }
                } else {
                    self.stop_counts[axis_id] = 0;
                    prev[axis_id] = x;
                    prev[axis_id + 1] = y;
                }

                let value = MoveValue::Stick { x, y };
                let event = if stopped {
                    TrackerEvent::MoveStopped {
                        device: slot,
                        control: axis_id,
                        value,
                    }
                } else {
                    TrackerEvent::Move {
                        device: slot,
                        control: axis_id,
                        value,
                    }
                };
                self.bus.publish(&event);
            }

            axis_id += 2;
        }

        Ok(())
    }
}

// Helper function to round raw readings to two decimal places, the precision
// the diffing operates at.
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_two_decimal_places() {
        assert_eq!(round2(0.056), 0.06);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(-0.156), -0.16);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn default_settings_match_documented_values() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.stick_deadzone, 0.15);
        assert_eq!(settings.trigger_deadzone, 0.05);
        assert_eq!(settings.polls_per_second, 60);
        assert_eq!(settings.stop_iteration_threshold, 5);
    }
}
