//! Firmcom is a host-side client for the [Firmata](https://github.com/firmata/protocol)
//! protocol. It talks to a microcontroller running a Firmata firmware over a
//! serial connection: it discovers what the board can do, drives its pins and
//! I2C bus, and receives a continuous stream of pin values.
//!
//! The crate is organized around a small protocol engine:
//!
//! * [`protocol`] holds the pure parts: the 7-bit wire codec, the message
//!   decoder and the frame encoder.
//! * The frame reader runs on a background thread. It splits the inbound byte
//!   stream into messages, decodes them, applies them to the [`BoardState`]
//!   cache and queues them for the consumer in wire order.
//! * A [`Controller`] encodes commands and writes them, one whole frame at a
//!   time, keeping the output caches of the [`BoardState`] in sync.
//! * A [`Board`] ties the above to one transport.
//!
//! The frame reader is implemented as a state machine with the following
//! characteristics:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed (the bytes of a
//!   sysex message being received, the status byte of a short message).
//! * Data shared between **all** states (the transport, the board state and
//!   the queue) is moved from state to state.
//! * Transitions between states are triggered via typed **events** and
//!   implemented with the `From` trait, so that only the transitions that are
//!   explicitly defined compile.
//!
//! **Example** - Reading the firmware of a board:
//! ```no_run
//! use firmcom::{Board, DecodedMessage, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new().path("/dev/ttyACM0").finalize();
//! let board = Board::open(&settings)?;
//! board.query_firmware()?;
//! while let Ok(message) = board.recv() {
//!     if let DecodedMessage::FirmwareReport { name, major, minor } = message? {
//!         println!("{} v{}.{}", name, major, minor);
//!         break;
//!     }
//! }
//! # Ok::<(), firmcom::Error>(())
//! ```

mod board;
mod error;
pub mod protocol;
mod reader;
mod settings;
pub mod utils;

pub use board::{Board, BoardState, Controller, Firmware, PinState};
pub use error::{Error, Result};
pub use protocol::{Capability, DecodedMessage, I2cMode, PinMode};
pub use reader::EventReceiver;
pub use settings::{Settings, SettingsBuilder};
