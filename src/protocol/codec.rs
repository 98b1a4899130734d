//! 7-bit packing used on the wire.
//!
//! The top bit of every byte is reserved for commands, so data bytes only
//! carry 7 bits. Multi-byte values are sent little-endian, least significant
//! 7 bits first.

/// Combine two 7-bit wire bytes into a 14-bit value.
pub fn decode14(lsb: u8, msb: u8) -> u16 {
    u16::from(lsb & 0x7F) | (u16::from(msb & 0x7F) << 7)
}

/// Split a value into its two 7-bit wire bytes `(lsb, msb)`.
///
/// Only the low 14 bits are transmitted.
pub fn encode7pair(value: u16) -> (u8, u8) {
    ((value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8)
}

/// Pack 8-bit data so that every byte becomes a 7-bit pair on the wire.
pub fn pack_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        let (lsb, msb) = encode7pair(u16::from(b));
        wire.push(lsb);
        wire.push(msb);
    }
    wire
}

/// Reverse of [`pack_bytes`]. A trailing unpaired byte is ignored.
pub fn unpack_bytes(wire: &[u8]) -> Vec<u8> {
    wire.chunks_exact(2)
        .map(|pair| decode14(pair[0], pair[1]) as u8)
        .collect()
}

/// Decode a string sent as one 7-bit pair per character.
pub fn unpack_string(wire: &[u8]) -> String {
    wire.chunks_exact(2)
        .map(|pair| {
            std::char::from_u32(u32::from(decode14(pair[0], pair[1])))
                .unwrap_or(std::char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// Decode a variable length integer where byte `i` contributes bits
/// `7*i .. 7*i+7`. Bytes beyond the fifth do not fit and are ignored.
pub fn decode_varint(wire: &[u8]) -> u32 {
    wire.iter()
        .take(5)
        .enumerate()
        .fold(0u32, |acc, (i, b)| acc | (u32::from(b & 0x7F) << (7 * i)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode14_inverts_encode7pair() {
        for v in 0..=16383u16 {
            let (lsb, msb) = encode7pair(v);
            assert!(lsb < 0x80 && msb < 0x80);
            assert_eq!(decode14(lsb, msb), v);
        }
    }

    #[test]
    fn encode7pair_drops_bits_above_14() {
        assert_eq!(encode7pair(0x4000), (0, 0));
        assert_eq!(encode7pair(0xFFFF), (0x7F, 0x7F));
    }

    #[test]
    fn pack_bytes_doubles_length() {
        assert_eq!(pack_bytes(&[0x05, 0xFF, 0x80]), [0x05, 0x00, 0x7F, 0x01, 0x00, 0x01]);
        assert_eq!(unpack_bytes(&[0x05, 0x00, 0x7F, 0x01, 0x00, 0x01]), [0x05, 0xFF, 0x80]);
    }

    #[test]
    fn unpack_bytes_ignores_trailing_byte() {
        assert_eq!(unpack_bytes(&[0x10, 0x00, 0x22]), [0x10]);
    }

    #[test]
    fn unpack_string_reads_pairs() {
        let wire = [b'S', 0, b't', 0, b'd', 0];
        assert_eq!(unpack_string(&wire), "Std");
    }

    #[test]
    fn decode_varint_shifts_by_seven() {
        assert_eq!(decode_varint(&[]), 0);
        assert_eq!(decode_varint(&[0x01]), 1);
        assert_eq!(decode_varint(&[0x7F, 0x01]), 255);
        assert_eq!(decode_varint(&[0x00, 0x00, 0x01]), 1 << 14);
    }
}
