//! `firmcom` frame reader.
//!
//! The reader runs on its own thread, blocking on the transport, and turns the
//! inbound byte stream into [`DecodedMessage`]s. Each message is applied to the
//! shared [`BoardState`](crate::BoardState) and then pushed, in wire order, on
//! a bounded queue. When the queue is full the reader waits for the consumer.
//!
//! A transport error ends the reader: it is delivered once as an `Err` on the
//! queue, after which the queue disconnects.
//!
//! **Example** - Running the reader on the current thread:
//! ```ignore
//! let (tx, rx) = std::sync::mpsc::sync_channel(16);
//! let mut reader = reader::factory(Box::new(port), state, tx);
//! let status = reader.run(); // 1 after a transport error
//! ```

mod events;
mod state_machine;
mod states;

use std::sync::mpsc::{Receiver, SyncSender};

use crate::error::Result;
use crate::protocol::DecodedMessage;

pub(crate) use state_machine::factory;

/// Receiving end of the queue of decoded messages.
pub type EventReceiver = Receiver<Result<DecodedMessage>>;

pub(crate) type EventSender = SyncSender<Result<DecodedMessage>>;
