//! Build the frames for the commands a host can send.
//!
//! The builders only produce bytes. Writing them, and keeping the
//! [`BoardState`](crate::BoardState) caches in sync, is the job of the
//! [`Controller`](crate::Controller).

use super::codec::{encode7pair, pack_bytes};
use super::constants::*;
use super::{I2cMode, PinMode};

/// The port a digital pin belongs to.
pub fn port_of(pin: u8) -> u8 {
    (pin >> 3) & 0x0F
}

/// Wrap a sysex body (subtype and fields) between the start/end markers.
pub fn sysex(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(START_SYSEX);
    frame.extend_from_slice(body);
    frame.push(END_SYSEX);
    frame
}

pub fn set_pin_mode(pin: u8, mode: PinMode) -> [u8; 3] {
    [SET_PIN_MODE, pin & 0x7F, u8::from(mode) & 0x7F]
}

/// Send the 8 pins of `port` at once. `value` is the full port byte.
pub fn digital_port(port: u8, value: u8) -> [u8; 3] {
    let (lsb, msb) = encode7pair(u16::from(value));
    [DIGITAL_MESSAGE | (port & 0x0F), lsb, msb]
}

pub fn analog_write(pin: u8, value: u16) -> [u8; 3] {
    let (lsb, msb) = encode7pair(value);
    [ANALOG_MESSAGE | (pin & 0x0F), lsb, msb]
}

pub fn report_analog(pin: u8, enable: bool) -> [u8; 2] {
    [REPORT_ANALOG | (pin & 0x0F), enable as u8]
}

/// Digital reporting is per port: this enables the whole port of `pin`.
pub fn report_digital(pin: u8, enable: bool) -> [u8; 2] {
    [REPORT_DIGITAL | port_of(pin), enable as u8]
}

pub fn query_capabilities() -> Vec<u8> {
    sysex(&[CAPABILITY_QUERY])
}

pub fn query_analog_mapping() -> Vec<u8> {
    sysex(&[ANALOG_MAPPING_QUERY])
}

pub fn query_firmware() -> Vec<u8> {
    sysex(&[REPORT_FIRMWARE])
}

pub fn query_pin_state(pin: u8) -> Vec<u8> {
    sysex(&[PIN_STATE_QUERY, pin & 0x7F])
}

/// Configure I2C with the delay (in microseconds) the board waits between
/// writing a register and reading it back.
pub fn i2c_config(delay: u16) -> Vec<u8> {
    let (lsb, msb) = encode7pair(delay);
    sysex(&[I2C_CONFIG, lsb, msb])
}

/// Set how often (in milliseconds) the board samples and reports inputs.
pub fn set_sampling_interval(interval: u16) -> Vec<u8> {
    let (lsb, msb) = encode7pair(interval);
    sysex(&[SAMPLING_INTERVAL, lsb, msb])
}

/// An I2C request to a 7-bit `address`. Every byte of `data` is sent as a
/// 7-bit pair.
pub fn i2c_request(address: u8, mode: I2cMode, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(3 + data.len() * 2);
    body.push(I2C_REQUEST);
    body.push(address & 0x7F);
    body.push(u8::from(mode) << 3);
    body.extend(pack_bytes(data));
    sysex(&body)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_mode_frame() {
        assert_eq!(set_pin_mode(13, PinMode::Output), [0xF4, 0x0D, 0x01]);
        assert_eq!(set_pin_mode(0xFF, PinMode::Other(0xFE)), [0xF4, 0x7F, 0x7E]);
    }

    #[test]
    fn digital_port_frame_splits_the_port_byte() {
        assert_eq!(digital_port(1, 0x30), [0x91, 0x30, 0x00]);
        assert_eq!(digital_port(0, 0xFF), [0x90, 0x7F, 0x01]);
    }

    #[test]
    fn port_of_groups_by_eight() {
        assert_eq!(port_of(0), 0);
        assert_eq!(port_of(7), 0);
        assert_eq!(port_of(8), 1);
        assert_eq!(port_of(13), 1);
        assert_eq!(port_of(127), 15);
    }

    #[test]
    fn analog_write_frame() {
        assert_eq!(analog_write(3, 1023), [0xE3, 0x7F, 0x07]);
    }

    #[test]
    fn report_frames_are_two_bytes() {
        assert_eq!(report_analog(2, true), [0xC2, 0x01]);
        assert_eq!(report_analog(2, false), [0xC2, 0x00]);
        assert_eq!(report_digital(13, true), [0xD1, 0x01]);
    }

    #[test]
    fn queries_are_wrapped_in_sysex() {
        assert_eq!(query_capabilities(), [0xF0, 0x6B, 0xF7]);
        assert_eq!(query_analog_mapping(), [0xF0, 0x69, 0xF7]);
        assert_eq!(query_firmware(), [0xF0, 0x79, 0xF7]);
        assert_eq!(query_pin_state(13), [0xF0, 0x6D, 0x0D, 0xF7]);
    }

    #[test]
    fn config_frames_use_seven_bit_pairs() {
        assert_eq!(i2c_config(200), [0xF0, 0x78, 0x48, 0x01, 0xF7]);
        assert_eq!(set_sampling_interval(19), [0xF0, 0x7A, 0x13, 0x00, 0xF7]);
        assert_eq!(set_sampling_interval(1000), [0xF0, 0x7A, 0x68, 0x07, 0xF7]);
    }

    #[test]
    fn i2c_request_doubles_payload() {
        assert_eq!(
            i2c_request(0x48, I2cMode::Read, &[0x00, 0x02]),
            [0xF0, 0x76, 0x48, 0x08, 0x00, 0x00, 0x02, 0x00, 0xF7]
        );
        assert_eq!(
            i2c_request(0x48, I2cMode::Write, &[0xFF]),
            [0xF0, 0x76, 0x48, 0x00, 0x7F, 0x01, 0xF7]
        );
        assert_eq!(i2c_request(0x48, I2cMode::StopReading, &[]).len(), 5);
    }
}
