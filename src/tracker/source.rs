use serde::{Deserialize, Serialize};

/// A single button sample as reported by the platform.
///
/// Digital buttons report `value` as 0.0 or 1.0; the shoulder triggers report
/// a continuous value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonReading {
    pub pressed: bool,
    pub value: f32,
}

impl ButtonReading {
    pub fn released() -> Self {
        Self {
            pressed: false,
            value: 0.0,
        }
    }
}

// Mapping kind reported per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingKind {
    /// The platform normalized this device to the standard gamepad layout.
    Standard,
    /// Unrecognized layout; the tracker ignores these devices entirely.
    NonStandard,
}

/// Raw per-device state as read from the platform on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDeviceState {
    pub name: String,
    pub connected: bool,
    pub mapping: MappingKind,
    pub buttons: Vec<ButtonReading>,
    pub axes: Vec<f32>,
}

/// Button indices of the standard gamepad layout.
///
/// The two shoulder triggers ([`ButtonType::LeftTrigger`] and
/// [`ButtonType::RightTrigger`]) are analog and get move/stop treatment
/// instead of press/release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LeftBumper = 4,
    RightBumper = 5,
    LeftTrigger = 6,
    RightTrigger = 7,
    Select = 8,
    Start = 9,
    LeftStick = 10,
    RightStick = 11,
    DPadUp = 12,
    DPadDown = 13,
    DPadLeft = 14,
    DPadRight = 15,
    Guide = 16,
}

impl ButtonType {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Capability the tracker polls once per tick for the state of every
/// device slot.
///
/// Implementations must return an index-aligned snapshot per call: slot `i`
/// in one snapshot refers to the same physical device as slot `i` in the
/// next, `None` marks a hole left by a disconnected device, and returning a
/// shorter vector than before disconnects the trailing slots.
pub trait DeviceSource {
    /// Whether the platform can enumerate input devices at all.
    ///
    /// Checked once at start; a `false` here is the only way polling can
    /// refuse to begin.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the current state of every device slot.
    fn snapshot(&mut self) -> Vec<Option<RawDeviceState>>;
}
