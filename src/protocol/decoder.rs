//! Turn complete messages into [`DecodedMessage`]s.
//!
//! Decoding never fails: anything that is not understood, including a known
//! subtype that is too short to carry its fields, becomes
//! [`DecodedMessage::Unknown`] with the bytes as received.

use super::codec::{decode14, decode_varint, unpack_bytes, unpack_string};
use super::constants::*;
use super::{Capability, DecodedMessage, PinMode};

/// Decode the body of a sysex message, without the start/end markers. The
/// first byte is the subtype.
pub fn decode_sysex(data: &[u8]) -> DecodedMessage {
    let decoded = match data.split_first() {
        Some((&REPORT_FIRMWARE, body)) => firmware_report(body),
        Some((&CAPABILITY_RESPONSE, body)) => Some(capability_report(body)),
        Some((&ANALOG_MAPPING_RESPONSE, body)) => Some(analog_mapping_report(body)),
        Some((&PIN_STATE_RESPONSE, body)) => pin_state_report(body),
        Some((&I2C_REPLY, body)) => i2c_reply(body),
        _ => None,
    };
    decoded.unwrap_or_else(|| DecodedMessage::Unknown { raw: data.to_vec() })
}

/// Decode a short message given its status byte and two data bytes.
pub fn decode_short(status: u8, first: u8, second: u8) -> DecodedMessage {
    match command_of(status) {
        ANALOG_MESSAGE => DecodedMessage::AnalogValue {
            pin: status & 0x0F,
            value: decode14(first, second),
        },
        DIGITAL_MESSAGE => DecodedMessage::DigitalPortValue {
            port: status & 0x0F,
            value: decode14(first, second) as u8,
        },
        REPORT_VERSION => DecodedMessage::ProtocolVersion {
            major: first,
            minor: second,
        },
        _ => DecodedMessage::Unknown {
            raw: vec![status, first, second],
        },
    }
}

/// The command selected by a status byte: the high nibble below `0xF0`, the
/// whole byte otherwise.
pub fn command_of(status: u8) -> u8 {
    if status < 0xF0 {
        status & 0xF0
    } else {
        status
    }
}

// -----------------------------------------------------------------------------
// Sysex subtypes
// -----------------------------------------------------------------------------

fn firmware_report(body: &[u8]) -> Option<DecodedMessage> {
    match body {
        [major, minor, name @ ..] => Some(DecodedMessage::FirmwareReport {
            major: *major,
            minor: *minor,
            name: unpack_string(name),
        }),
        _ => None,
    }
}

fn capability_report(body: &[u8]) -> DecodedMessage {
    let mut pins = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    while i < body.len() {
        if body[i] == CAPABILITY_PIN_END {
            pins.push(std::mem::take(&mut current));
            i += 1;
            continue;
        }
        // A mode without its resolution cannot be used.
        if let Some(&resolution) = body.get(i + 1) {
            current.push(Capability {
                mode: PinMode::from(body[i]),
                resolution,
            });
        }
        i += 2;
    }
    if !current.is_empty() {
        pins.push(current);
    }
    DecodedMessage::CapabilityReport { pins }
}

fn analog_mapping_report(body: &[u8]) -> DecodedMessage {
    let mapping = body
        .iter()
        .map(|&channel| {
            if channel == NO_ANALOG_CHANNEL {
                None
            } else {
                Some(channel)
            }
        })
        .collect();
    DecodedMessage::AnalogMappingReport { mapping }
}

fn pin_state_report(body: &[u8]) -> Option<DecodedMessage> {
    match body {
        [pin, mode, state @ ..] => Some(DecodedMessage::PinStateReport {
            pin: *pin,
            mode: PinMode::from(*mode),
            state: decode_varint(state),
        }),
        _ => None,
    }
}

fn i2c_reply(body: &[u8]) -> Option<DecodedMessage> {
    match body {
        [addr_lsb, addr_msb, reg_lsb, reg_msb, data @ ..] => Some(DecodedMessage::I2cReply {
            address: decode14(*addr_lsb, *addr_msb),
            register: decode14(*reg_lsb, *reg_msb),
            data: unpack_bytes(data),
        }),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder;

    #[test]
    fn firmware_report_unpacks_name() {
        let msg = decode_sysex(&[REPORT_FIRMWARE, 2, 5, b'a', 0, b'b', 0]);
        assert_eq!(
            msg,
            DecodedMessage::FirmwareReport {
                major: 2,
                minor: 5,
                name: "ab".into(),
            }
        );
    }

    #[test]
    fn firmware_report_without_version_is_unknown() {
        let raw = vec![REPORT_FIRMWARE, 2];
        assert_eq!(decode_sysex(&raw), DecodedMessage::Unknown { raw });
    }

    #[test]
    fn capability_response_splits_pins() {
        let msg = decode_sysex(&[CAPABILITY_RESPONSE, 0x00, 0x01, 127, 0x01, 0x01, 127]);
        assert_eq!(
            msg,
            DecodedMessage::CapabilityReport {
                pins: vec![
                    vec![Capability {
                        mode: PinMode::Input,
                        resolution: 1,
                    }],
                    vec![Capability {
                        mode: PinMode::Output,
                        resolution: 1,
                    }],
                ],
            }
        );
    }

    #[test]
    fn capability_response_keeps_pins_without_modes() {
        let msg = decode_sysex(&[CAPABILITY_RESPONSE, 127, 0x02, 0x0A, 0x03, 0x08, 127]);
        match msg {
            DecodedMessage::CapabilityReport { pins } => {
                assert_eq!(pins.len(), 2);
                assert!(pins[0].is_empty());
                assert_eq!(pins[1][0].mode, PinMode::Analog);
                assert_eq!(pins[1][0].resolution, 10);
                assert_eq!(pins[1][1].mode, PinMode::Pwm);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn capability_response_keeps_unterminated_last_pin() {
        let msg = decode_sysex(&[CAPABILITY_RESPONSE, 0x00, 0x01, 127, 0x0B, 0x01, 0x04]);
        match msg {
            DecodedMessage::CapabilityReport { pins } => {
                assert_eq!(pins.len(), 2);
                assert_eq!(pins[1], vec![Capability {
                    mode: PinMode::Other(0x0B),
                    resolution: 1,
                }]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn analog_mapping_marks_unmapped_pins() {
        let msg = decode_sysex(&[ANALOG_MAPPING_RESPONSE, 127, 127, 0, 1]);
        assert_eq!(
            msg,
            DecodedMessage::AnalogMappingReport {
                mapping: vec![None, None, Some(0), Some(1)],
            }
        );
    }

    #[test]
    fn pin_state_is_a_little_endian_integer() {
        let msg = decode_sysex(&[PIN_STATE_RESPONSE, 13, 0x01, 0x7F, 0x01]);
        assert_eq!(
            msg,
            DecodedMessage::PinStateReport {
                pin: 13,
                mode: PinMode::Output,
                state: 255,
            }
        );
    }

    #[test]
    fn i2c_reply_decodes_pairs() {
        let msg = decode_sysex(&[I2C_REPLY, 0x10, 0x00, 0x20, 0x00, 0x05, 0x00]);
        assert_eq!(
            msg,
            DecodedMessage::I2cReply {
                address: 16,
                register: 32,
                data: vec![5],
            }
        );
    }

    #[test]
    fn short_i2c_reply_is_unknown() {
        let raw = vec![I2C_REPLY, 0x10, 0x00, 0x20];
        assert_eq!(decode_sysex(&raw), DecodedMessage::Unknown { raw });
    }

    #[test]
    fn unrecognized_sysex_is_unknown() {
        let raw = vec![0x71, b'h', 0, b'i', 0];
        assert_eq!(decode_sysex(&raw), DecodedMessage::Unknown { raw });
        assert_eq!(decode_sysex(&[]), DecodedMessage::Unknown { raw: vec![] });
    }

    #[test]
    fn protocol_version_short_message() {
        assert_eq!(
            decode_short(REPORT_VERSION, 2, 5),
            DecodedMessage::ProtocolVersion { major: 2, minor: 5 }
        );
    }

    #[test]
    fn digital_port_short_message() {
        assert_eq!(
            decode_short(0x91, 0x30, 0x01),
            DecodedMessage::DigitalPortValue {
                port: 1,
                value: 0xB0,
            }
        );
    }

    #[test]
    fn unrecognized_short_message_is_unknown() {
        assert_eq!(
            decode_short(0xA3, 0x01, 0x02),
            DecodedMessage::Unknown {
                raw: vec![0xA3, 0x01, 0x02],
            }
        );
    }

    #[test]
    fn analog_message_round_trips() {
        for status in 0xE0..=0xEFu8 {
            for first in 0..0x80u8 {
                for second in 0..0x80u8 {
                    let (pin, value) = match decode_short(status, first, second) {
                        DecodedMessage::AnalogValue { pin, value } => (pin, value),
                        other => panic!("unexpected {:?}", other),
                    };
                    assert_eq!(encoder::analog_write(pin, value), [status, first, second]);
                }
            }
        }
    }
}
