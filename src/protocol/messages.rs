//! Typed values exchanged with the board.

use std::fmt;

// PinMode =====================================================================

/// The mode a pin operates in.
///
/// Boards may report modes this crate has no name for; those are kept as
/// [`PinMode::Other`] so that capability tables stay faithful to the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PinMode {
    Input,
    Output,
    Analog,
    Pwm,
    Servo,
    Shift,
    I2c,
    Other(u8),
}

impl From<u8> for PinMode {
    fn from(mode: u8) -> Self {
        match mode {
            0x00 => PinMode::Input,
            0x01 => PinMode::Output,
            0x02 => PinMode::Analog,
            0x03 => PinMode::Pwm,
            0x04 => PinMode::Servo,
            0x05 => PinMode::Shift,
            0x06 => PinMode::I2c,
            other => PinMode::Other(other),
        }
    }
}

impl From<PinMode> for u8 {
    fn from(mode: PinMode) -> Self {
        match mode {
            PinMode::Input => 0x00,
            PinMode::Output => 0x01,
            PinMode::Analog => 0x02,
            PinMode::Pwm => 0x03,
            PinMode::Servo => 0x04,
            PinMode::Shift => 0x05,
            PinMode::I2c => 0x06,
            PinMode::Other(other) => other,
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Input => write!(f, "input"),
            PinMode::Output => write!(f, "output"),
            PinMode::Analog => write!(f, "analog"),
            PinMode::Pwm => write!(f, "pwm"),
            PinMode::Servo => write!(f, "servo"),
            PinMode::Shift => write!(f, "shift"),
            PinMode::I2c => write!(f, "i2c"),
            PinMode::Other(mode) => write!(f, "mode 0x{:02X}", mode),
        }
    }
}

// I2cMode =====================================================================

/// Read/write mode of an I2C request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum I2cMode {
    Write,
    Read,
    ContinuousRead,
    StopReading,
}

impl From<I2cMode> for u8 {
    fn from(mode: I2cMode) -> Self {
        match mode {
            I2cMode::Write => 0x00,
            I2cMode::Read => 0x01,
            I2cMode::ContinuousRead => 0x02,
            I2cMode::StopReading => 0x03,
        }
    }
}

// Capability ==================================================================

/// One supported mode of a pin, with its resolution in bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capability {
    pub mode: PinMode,
    pub resolution: u8,
}

// DecodedMessage ==============================================================

/// A complete message received from the board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DecodedMessage {
    /// Name and version of the firmware running on the board.
    FirmwareReport { major: u8, minor: u8, name: String },
    /// Supported modes of every pin, indexed by pin number.
    CapabilityReport { pins: Vec<Vec<Capability>> },
    /// Analog channel of every pin, indexed by pin number; `None` when the pin
    /// is not analog capable.
    AnalogMappingReport { mapping: Vec<Option<u8>> },
    /// Current mode and state of a single pin.
    PinStateReport { pin: u8, mode: PinMode, state: u32 },
    /// Data read from an I2C device.
    I2cReply { address: u16, register: u16, data: Vec<u8> },
    /// Value sampled on an analog channel.
    AnalogValue { pin: u8, value: u16 },
    /// Values of the 8 pins of a digital port.
    DigitalPortValue { port: u8, value: u8 },
    /// Version of the Firmata protocol implemented by the board.
    ProtocolVersion { major: u8, minor: u8 },
    /// Anything this crate does not understand, kept as received.
    Unknown { raw: Vec<u8> },
}
