//! States for the frame reader state machine.
//!
//! This modules is private and restricted to the [`reader`](crate::reader)
//! scope.
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{
    fmt,
    io::{self, Read},
    sync::{Arc, Mutex},
};

use hexplay::HexViewBuilder;
use log::{debug, error, info, log_enabled, trace, Level::Debug};

use super::events::*;
use super::EventSender;
use crate::board::{lock, BoardState};
use crate::error::Error;
use crate::protocol::constants::{END_SYSEX, START_SYSEX};
use crate::protocol::{decoder, DecodedMessage};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Data shared by all the states: where bytes come from and where decoded
/// messages go.
pub(crate) struct ReaderContext {
    pub transport: Box<dyn Read + Send>,
    pub board: Arc<Mutex<BoardState>>,
    pub events: EventSender,
}
impl ReaderContext {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.transport.read_exact(&mut byte)?;
        trace!("read {:02X}", byte[0]);
        Ok(byte[0])
    }

    /// Apply `message` to the board state, then queue it. Returns `false` when
    /// the receiving end of the queue is gone.
    fn deliver(&mut self, message: DecodedMessage) -> bool {
        lock(&self.board).apply(&message);
        match &message {
            DecodedMessage::Unknown { raw } if log_enabled!(Debug) => {
                let view = HexViewBuilder::new(raw).row_width(16).finish();
                debug!("received unknown message\n{}", view);
            }
            _ => debug!("received {:?}", message),
        }
        self.events.send(Ok(message)).is_ok()
    }
}
impl fmt::Debug for ReaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderContext")
            .field("board", &self.board)
            .finish()
    }
}

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// Do the work of the state, reading from the transport as needed, then
    /// request the next transition by returning the appropriate `event`. The
    /// context is handed over to the event and on to the next state.
    fn run(self, ctx: ReaderContext) -> Event;
}

// Idle State ==================================================================

/// Waiting for the first byte of a message.
///
///  * **[`SysexStartEvent`] => [`InSysexState`]** on `START_SYSEX`,
///  * **[`ShortMessageStartEvent`] => [`InShortMessageState`]** on any other
///    byte,
///  * **[`DoneEvent`] => [`DoneState`]** when the transport fails.
#[derive(Debug)]
pub(crate) struct IdleState {}
impl Runnable for IdleState {
    fn run(self, mut ctx: ReaderContext) -> Event {
        trace!("=> Idle");
        match ctx.read_byte() {
            Ok(START_SYSEX) => Event::SysexStart(SysexStartEvent { ctx }),
            Ok(status) => Event::ShortMessageStart(ShortMessageStartEvent { ctx, status }),
            Err(e) => Event::Done(DoneEvent {
                ctx,
                error: Some(Error::Io(e)),
            }),
        }
    }
}

// InSysex State ===============================================================

/// Accumulating the body of a sysex message until `END_SYSEX`. The buffer has
/// no size limit: a frame that never ends keeps growing until the transport
/// fails.
///
///  * **[`MessageCompleteEvent`] => [`IdleState`]** once the message is
///    delivered,
///  * **[`DoneEvent`] => [`DoneState`]** when the transport fails before the
///    end marker, or when the queue is gone.
#[derive(Debug)]
pub(crate) struct InSysexState {
    pub data: Vec<u8>,
}
impl Runnable for InSysexState {
    fn run(mut self, mut ctx: ReaderContext) -> Event {
        trace!("=> InSysex");
        loop {
            match ctx.read_byte() {
                Ok(END_SYSEX) => break,
                Ok(byte) => self.data.push(byte),
                Err(source) => {
                    return Event::Done(DoneEvent {
                        ctx,
                        error: Some(Error::Truncated {
                            message: "sysex",
                            source,
                        }),
                    })
                }
            }
        }
        let message = decoder::decode_sysex(&self.data);
        complete(ctx, message)
    }
}

// InShortMessage State ========================================================

/// Reading the two data bytes that follow a status byte.
///
///  * **[`MessageCompleteEvent`] => [`IdleState`]** once the message is
///    delivered,
///  * **[`DoneEvent`] => [`DoneState`]** when the transport fails before both
///    bytes arrived, or when the queue is gone.
#[derive(Debug)]
pub(crate) struct InShortMessageState {
    pub status: u8,
}
impl Runnable for InShortMessageState {
    fn run(self, mut ctx: ReaderContext) -> Event {
        trace!("=> InShortMessage");
        let mut data = [0u8; 2];
        if let Err(source) = ctx.transport.read_exact(&mut data) {
            return Event::Done(DoneEvent {
                ctx,
                error: Some(Error::Truncated {
                    message: "short message",
                    source,
                }),
            });
        }
        trace!("read {:02X?}", data);
        let message = decoder::decode_short(self.status, data[0], data[1]);
        complete(ctx, message)
    }
}

// Done State ==================================================================

/// Reached when the reader stops.
///
/// Like the other done states, it runs in two phases: the first run reports
/// the terminal error on the queue (at most once), then fires [`ExitEvent`]
/// which lands back here with `should_exit` set.
#[derive(Debug)]
pub(crate) struct DoneState {
    pub error: Option<Error>,
    /// When `true`, indicates that the reader stopped on a transport error.
    pub with_error: bool,
    /// When `true` instructs the reader to exit its event loop.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(mut self, ctx: ReaderContext) -> Event {
        if !self.should_exit {
            info!(
                "=> Done with{}errors",
                if self.with_error { " " } else { " no " }
            );
        }
        if let Some(error) = self.error.take() {
            error!("reader stopped: {}", error);
            // Nothing left to do if the consumer is gone too.
            let _ = ctx.events.send(Err(error));
        }
        Event::Exit(ExitEvent {
            ctx,
            with_error: self.with_error,
        })
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn complete(mut ctx: ReaderContext, message: DecodedMessage) -> Event {
    if ctx.deliver(message) {
        Event::MessageComplete(MessageCompleteEvent { ctx })
    } else {
        info!("message queue closed, stopping the reader");
        Event::Done(DoneEvent { ctx, error: None })
    }
}
