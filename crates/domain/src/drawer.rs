use serde::{Deserialize, Serialize};

/// ESC p: generate pulse on the drawer kick-out connector
pub const DRAWER_KICK_OPCODE: [u8; 2] = [0x1B, 0x70];

/// Pulse durations are encoded in 2 ms units
const PULSE_UNIT_MS: u16 = 2;

/// Connector pin the drawer solenoid is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DrawerPin {
    /// Drawer kick-out connector pin 2
    #[default]
    Pin2,
    /// Drawer kick-out connector pin 5
    Pin5,
}

impl DrawerPin {
    pub fn select_byte(&self) -> u8 {
        match self {
            Self::Pin2 => 0x00,
            Self::Pin5 => 0x01,
        }
    }
}

/// A single drawer-kick pulse: pin plus on/off durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerKick {
    pub pin: DrawerPin,
    pub on_ms: u16,
    pub off_ms: u16,
}

impl Default for DrawerKick {
    fn default() -> Self {
        Self {
            pin: DrawerPin::Pin2,
            on_ms: 50,
            off_ms: 240,
        }
    }
}

impl DrawerKick {
    pub fn new(pin: DrawerPin, on_ms: u16, off_ms: u16) -> Self {
        Self { pin, on_ms, off_ms }
    }

    pub fn with_pin(pin: DrawerPin) -> Self {
        Self {
            pin,
            ..Self::default()
        }
    }

    /// The complete command, issued as one write.
    pub fn encode(&self) -> [u8; 5] {
        [
            DRAWER_KICK_OPCODE[0],
            DRAWER_KICK_OPCODE[1],
            self.pin.select_byte(),
            to_pulse_units(self.on_ms),
            to_pulse_units(self.off_ms),
        ]
    }
}

// Saturates at 255 units (510 ms)
fn to_pulse_units(ms: u16) -> u8 {
    (ms / PULSE_UNIT_MS).min(u8::MAX as u16) as u8
}
