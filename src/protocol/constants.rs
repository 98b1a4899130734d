//! Byte constants of the Firmata protocol.
//!
//! Command bytes (`0x80`-`0xFF`) start short messages, some of them carry a
//! port or pin number in their low nibble. Sysex subtypes (`0x00`-`0x7F`) are
//! the first byte inside a `START_SYSEX` .. `END_SYSEX` frame.

// Framing =====================================================================

/// Start a sysex message.
pub const START_SYSEX: u8 = 0xF0;
/// End a sysex message.
pub const END_SYSEX: u8 = 0xF7;

// Short message commands ======================================================

/// Digital data for a whole port, ORed with the port number.
pub const DIGITAL_MESSAGE: u8 = 0x90;
/// Analog (or PWM) value for a pin, ORed with the pin number.
pub const ANALOG_MESSAGE: u8 = 0xE0;
/// Enable/disable analog reporting, ORed with the pin number.
pub const REPORT_ANALOG: u8 = 0xC0;
/// Enable/disable digital reporting, ORed with the port number.
pub const REPORT_DIGITAL: u8 = 0xD0;
/// Set a pin to one of the [`PinMode`](super::PinMode)s.
pub const SET_PIN_MODE: u8 = 0xF4;
/// Protocol version report.
pub const REPORT_VERSION: u8 = 0xF9;

// Sysex subtypes ==============================================================

pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
pub const CAPABILITY_QUERY: u8 = 0x6B;
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
pub const PIN_STATE_QUERY: u8 = 0x6D;
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
pub const I2C_REQUEST: u8 = 0x76;
pub const I2C_REPLY: u8 = 0x77;
pub const I2C_CONFIG: u8 = 0x78;
/// Report name and version of the firmware.
pub const REPORT_FIRMWARE: u8 = 0x79;
/// Set the sampling interval of the board's main loop.
pub const SAMPLING_INTERVAL: u8 = 0x7A;

// Other values ================================================================

/// Closes the list of capabilities of one pin in a capability response.
pub const CAPABILITY_PIN_END: u8 = 127;
/// Marks a pin that has no analog channel in an analog mapping response.
pub const NO_ANALOG_CHANNEL: u8 = 127;
/// Number of digital ports addressable through the low nibble of a command.
pub const PORT_COUNT: usize = 16;
/// Number of analog channels addressable through the low nibble of a command.
pub const ANALOG_CHANNEL_COUNT: usize = 16;
