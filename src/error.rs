//! Errors reported by the Firmata engine.
//!
//! An unrecognized message is not an error: it is delivered as
//! [`DecodedMessage::Unknown`](crate::DecodedMessage::Unknown).

use std::io;

use thiserror::Error;

/// Errors that can occur while talking to a board.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Reading from or writing to the transport failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The transport failed while a message was only partially received.
    #[error("transport failed in the middle of a {message}: {source}")]
    Truncated {
        /// The kind of message being received (`sysex` or `short message`).
        message: &'static str,
        source: io::Error,
    },

    /// No serial port path was configured.
    #[error("no serial device was configured")]
    NoDevice,

    /// The background reader thread could not be started.
    #[error("failed to spawn the reader thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type used throughout `firmcom`.
pub type Result<T> = std::result::Result<T, Error>;
