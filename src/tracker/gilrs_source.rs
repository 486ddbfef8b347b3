use gilrs::{Axis, Button, Gamepad, GamepadId, Gilrs, MappingSource};
use tracing::{debug, error, info};

use crate::tracker::poller::TrackerError;
use crate::tracker::source::{ButtonReading, DeviceSource, MappingKind, RawDeviceState};

// Standard gamepad layout: button index -> gilrs button. Indices 6 and 7 are
// the analog triggers (gilrs calls the bumpers LeftTrigger/RightTrigger and
// the triggers LeftTrigger2/RightTrigger2).
const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

// Axis pairs: left stick at 0/1, right stick at 2/3.
const STANDARD_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Production device source backed by gilrs.
///
/// Keeps its own slot table so that devices hold a stable index across the
/// session: a disconnected device leaves a hole, and the next device to
/// connect takes the first free slot.
pub struct GilrsSource {
    gilrs: Gilrs,
    slots: Vec<Option<GamepadId>>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, TrackerError> {
        info!("Initializing gilrs gamepad backend");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(TrackerError::UnsupportedPlatform(e.to_string()));
            }
        };

        for (id, gamepad) in gilrs.gamepads() {
            info!("  [{}] {}", id, gamepad.name());
        }

        Ok(Self {
            gilrs,
            slots: Vec::new(),
        })
    }

    fn sync_slots(&mut self) {
        let connected: Vec<GamepadId> = self
            .gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, _)| id)
            .collect();

        // A vanished device leaves a hole so the remaining slots keep their
        // indices.
        for slot in self.slots.iter_mut() {
            if let Some(id) = *slot {
                if !connected.contains(&id) {
                    debug!("Gamepad {} left its slot", id);
                    *slot = None;
                }
            }
        }

        // Newly seen devices take the first free slot.
        for id in connected {
            if self.slots.iter().any(|slot| *slot == Some(id)) {
                continue;
            }
            match self.slots.iter_mut().find(|slot| slot.is_none()) {
                Some(free) => *free = Some(id),
                None => self.slots.push(Some(id)),
            }
        }
    }
}

impl DeviceSource for GilrsSource {
    fn snapshot(&mut self) -> Vec<Option<RawDeviceState>> {
        // Drain the event queue; gilrs refreshes its cached gamepad state and
        // hot-plug bookkeeping as events are consumed.
        while self.gilrs.next_event().is_some() {}

        self.sync_slots();

        self.slots
            .iter()
            .map(|slot| slot.map(|id| read_state(self.gilrs.gamepad(id))))
            .collect()
    }
}

fn read_state(gamepad: Gamepad<'_>) -> RawDeviceState {
    let mapping = match gamepad.mapping_source() {
        MappingSource::None => MappingKind::NonStandard,
        _ => MappingKind::Standard,
    };

    let buttons = STANDARD_BUTTONS
        .iter()
        .map(|&button| {
            let pressed = gamepad.is_pressed(button);
            let value = gamepad
                .button_data(button)
                .map_or(if pressed { 1.0 } else { 0.0 }, |data| data.value());
            ButtonReading { pressed, value }
        })
        .collect();

    let axes = STANDARD_AXES
        .iter()
        .map(|&axis| gamepad.axis_data(axis).map_or(0.0, |data| data.value()))
        .collect();

    RawDeviceState {
        name: gamepad.name().to_string(),
        connected: gamepad.is_connected(),
        mapping,
        buttons,
        axes,
    }
}
