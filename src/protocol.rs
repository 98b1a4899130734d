//! The Firmata wire protocol: constants, 7-bit codec, message types and the
//! decoder/encoder pair.
//!
//! Everything in this module is pure and free of I/O. The
//! [`reader`](crate::reader) feeds complete messages to the decoder, and the
//! [`Controller`](crate::Controller) writes the frames produced by the encoder.
//!
//! **Example** - Building an outbound frame and decoding an inbound one:
//! ```
//! use firmcom::protocol::{decoder, encoder, DecodedMessage, PinMode};
//!
//! assert_eq!(encoder::set_pin_mode(13, PinMode::Output), [0xF4, 13, 0x01]);
//!
//! let msg = decoder::decode_short(0xE2, 0x7F, 0x03);
//! assert_eq!(msg, DecodedMessage::AnalogValue { pin: 2, value: 511 });
//! ```

pub mod codec;
pub mod constants;
pub mod decoder;
pub mod encoder;
mod messages;

pub use messages::{Capability, DecodedMessage, I2cMode, PinMode};
