//! Last-known state of a board.
//!
//! The reader thread applies every decoded message before handing it to the
//! consumer, and the [`Controller`](crate::Controller) updates the output
//! caches as it writes. Consumers only ever see cloned snapshots.

use std::collections::BTreeMap;

use log::debug;

use crate::protocol::constants::{ANALOG_CHANNEL_COUNT, PORT_COUNT};
use crate::protocol::encoder::port_of;
use crate::protocol::{Capability, DecodedMessage, PinMode};

/// Name and version of the firmware running on the board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Firmware {
    pub major: u8,
    pub minor: u8,
    pub name: String,
}

/// Mode and state of a pin, as last reported by the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PinState {
    pub mode: PinMode,
    pub state: u32,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BoardState {
    ports: [u8; PORT_COUNT],
    input_ports: [u8; PORT_COUNT],
    analog: [u16; ANALOG_CHANNEL_COUNT],
    capabilities: Option<Vec<Vec<Capability>>>,
    analog_mapping: Option<Vec<Option<u8>>>,
    firmware: Option<Firmware>,
    protocol_version: Option<(u8, u8)>,
    pin_states: BTreeMap<u8, PinState>,
    pin_modes: BTreeMap<u8, PinMode>,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte last written to a digital port by this host.
    pub fn port(&self, port: u8) -> u8 {
        self.ports[usize::from(port & 0x0F)]
    }

    /// Value last written to a digital pin by this host.
    pub fn digital_value(&self, pin: u8) -> bool {
        self.port(port_of(pin)) & (1 << (pin & 0x07)) != 0
    }

    /// Byte of a digital port as last reported by the board. Only its input
    /// pins are meaningful.
    pub fn input_port(&self, port: u8) -> u8 {
        self.input_ports[usize::from(port & 0x0F)]
    }

    /// Value of a digital input pin as last reported by the board.
    pub fn digital_input(&self, pin: u8) -> bool {
        self.input_port(port_of(pin)) & (1 << (pin & 0x07)) != 0
    }

    /// Last value of an analog channel.
    pub fn analog_value(&self, channel: u8) -> u16 {
        self.analog[usize::from(channel & 0x0F)]
    }

    /// Capability table, indexed by pin, once the board has reported it.
    pub fn capabilities(&self) -> Option<&[Vec<Capability>]> {
        self.capabilities.as_deref()
    }

    /// Analog mapping table, indexed by pin, once the board has reported it.
    pub fn analog_mapping(&self) -> Option<&[Option<u8>]> {
        self.analog_mapping.as_deref()
    }

    /// Analog channel of a digital pin, if it has one.
    pub fn analog_channel(&self, pin: u8) -> Option<u8> {
        self.analog_mapping
            .as_ref()
            .and_then(|mapping| mapping.get(usize::from(pin)).copied().flatten())
    }

    /// Whether `pin` reported support for `mode`.
    pub fn supports(&self, pin: u8, mode: PinMode) -> bool {
        self.capabilities
            .as_ref()
            .and_then(|pins| pins.get(usize::from(pin)))
            .map_or(false, |caps| caps.iter().any(|c| c.mode == mode))
    }

    pub fn firmware(&self) -> Option<&Firmware> {
        self.firmware.as_ref()
    }

    /// `(major, minor)` version of the protocol implemented by the board.
    pub fn protocol_version(&self) -> Option<(u8, u8)> {
        self.protocol_version
    }

    /// Mode and state of `pin` from the last pin state response.
    pub fn pin_state(&self, pin: u8) -> Option<PinState> {
        self.pin_states.get(&pin).copied()
    }

    /// The mode last set on `pin` by this host.
    pub fn pin_mode(&self, pin: u8) -> Option<PinMode> {
        self.pin_modes.get(&pin).copied()
    }

    /// Update the caches from a message received from the board.
    pub fn apply(&mut self, message: &DecodedMessage) {
        match message {
            DecodedMessage::FirmwareReport { major, minor, name } => {
                self.firmware = Some(Firmware {
                    major: *major,
                    minor: *minor,
                    name: name.clone(),
                });
            }
            DecodedMessage::CapabilityReport { pins } => {
                if self.capabilities.is_none() {
                    self.capabilities = Some(pins.clone());
                } else {
                    debug!("capability table already known, ignoring new report");
                }
            }
            DecodedMessage::AnalogMappingReport { mapping } => {
                if self.analog_mapping.is_none() {
                    self.analog_mapping = Some(mapping.clone());
                } else {
                    debug!("analog mapping already known, ignoring new report");
                }
            }
            DecodedMessage::PinStateReport { pin, mode, state } => {
                self.pin_states.insert(
                    *pin,
                    PinState {
                        mode: *mode,
                        state: *state,
                    },
                );
            }
            DecodedMessage::AnalogValue { pin, value } => self.set_analog(*pin, *value),
            DecodedMessage::DigitalPortValue { port, value } => {
                self.input_ports[usize::from(port & 0x0F)] = *value;
            }
            DecodedMessage::ProtocolVersion { major, minor } => {
                self.protocol_version = Some((*major, *minor));
            }
            DecodedMessage::I2cReply { .. } | DecodedMessage::Unknown { .. } => {}
        }
    }

    /// The port of `pin` and the byte it takes once the bit of `pin` is set or
    /// cleared, the 7 other pins keeping their written values. The cache is
    /// left unchanged.
    pub(crate) fn port_with(&self, pin: u8, high: bool) -> (u8, u8) {
        let port = port_of(pin);
        let mask = 1 << (pin & 0x07);
        let value = if high {
            self.port(port) | mask
        } else {
            self.port(port) & !mask
        };
        (port, value)
    }

    pub(crate) fn set_port(&mut self, port: u8, value: u8) {
        self.ports[usize::from(port & 0x0F)] = value;
    }

    pub(crate) fn set_analog(&mut self, pin: u8, value: u16) {
        self.analog[usize::from(pin & 0x0F)] = value;
    }

    pub(crate) fn set_pin_mode(&mut self, pin: u8, mode: PinMode) {
        self.pin_modes.insert(pin & 0x7F, mode);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_writes_keep_sibling_bits() {
        let mut state = BoardState::new();
        assert_eq!(state.port_with(13, true), (1, 0b0010_0000));
        assert_eq!(state.port(1), 0);
        state.set_port(1, 0b0010_0000);
        assert_eq!(state.port_with(12, true), (1, 0b0011_0000));
        state.set_port(1, 0b0011_0000);
        assert!(state.digital_value(12));
        assert!(state.digital_value(13));
        assert_eq!(state.port_with(13, false), (1, 0b0001_0000));
        assert_eq!(state.port(0), 0);
    }

    #[test]
    fn port_reports_leave_written_bits_alone() {
        let mut state = BoardState::new();
        state.set_port(1, 0b0010_0000);
        state.apply(&DecodedMessage::DigitalPortValue { port: 1, value: 0x01 });
        assert_eq!(state.port(1), 0b0010_0000);
        assert_eq!(state.input_port(1), 0x01);
        assert!(state.digital_input(8));
        assert!(!state.digital_input(13));
        assert_eq!(state.port_with(12, true), (1, 0b0011_0000));
    }

    #[test]
    fn capability_table_is_set_once() {
        let mut state = BoardState::new();
        let first = vec![vec![Capability {
            mode: PinMode::Input,
            resolution: 1,
        }]];
        state.apply(&DecodedMessage::CapabilityReport { pins: first.clone() });
        state.apply(&DecodedMessage::CapabilityReport { pins: vec![] });
        assert_eq!(state.capabilities(), Some(&first[..]));
        assert!(state.supports(0, PinMode::Input));
        assert!(!state.supports(0, PinMode::Output));
        assert!(!state.supports(1, PinMode::Input));
    }

    #[test]
    fn analog_mapping_resolves_channels() {
        let mut state = BoardState::new();
        assert_eq!(state.analog_channel(14), None);
        let mut mapping = vec![None; 14];
        mapping.extend(vec![Some(0), Some(1)]);
        state.apply(&DecodedMessage::AnalogMappingReport { mapping });
        assert_eq!(state.analog_channel(14), Some(0));
        assert_eq!(state.analog_channel(15), Some(1));
        assert_eq!(state.analog_channel(3), None);
        assert_eq!(state.analog_channel(100), None);
    }

    #[test]
    fn received_values_update_caches() {
        let mut state = BoardState::new();
        state.apply(&DecodedMessage::AnalogValue { pin: 5, value: 700 });
        state.apply(&DecodedMessage::DigitalPortValue { port: 2, value: 0x81 });
        state.apply(&DecodedMessage::ProtocolVersion { major: 2, minor: 5 });
        state.apply(&DecodedMessage::PinStateReport {
            pin: 9,
            mode: PinMode::Pwm,
            state: 128,
        });
        assert_eq!(state.analog_value(5), 700);
        assert_eq!(state.input_port(2), 0x81);
        assert_eq!(state.port(2), 0);
        assert!(state.digital_input(16));
        assert!(state.digital_input(23));
        assert_eq!(state.protocol_version(), Some((2, 5)));
        assert_eq!(
            state.pin_state(9),
            Some(PinState {
                mode: PinMode::Pwm,
                state: 128,
            })
        );
    }
}
