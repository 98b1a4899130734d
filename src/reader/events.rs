//! Events for the frame reader state machine.
//!
//! This modules is private and restricted to the [`reader`](crate::reader)
//! scope. Every event carries the [`ReaderContext`] so that the transport and
//! the queue move from one state to the next.
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use super::states::ReaderContext;
use crate::error::Error;

// SysexStartEvent =============================================================

/// Fired from the `Idle` state when a `START_SYSEX` byte is read. Triggers the
/// transition to `InSysex`.
#[derive(Debug)]
pub(crate) struct SysexStartEvent {
    pub ctx: ReaderContext,
}

// ShortMessageStartEvent ======================================================

/// Fired from the `Idle` state when any other byte is read. That byte is the
/// status of a short message and is carried to `InShortMessage`.
#[derive(Debug)]
pub(crate) struct ShortMessageStartEvent {
    pub ctx: ReaderContext,
    pub status: u8,
}

// MessageCompleteEvent ========================================================

/// Fired once a message has been decoded, applied to the board state and
/// delivered. Brings the reader back to `Idle`.
#[derive(Debug)]
pub(crate) struct MessageCompleteEvent {
    pub ctx: ReaderContext,
}

// DoneEvent ===================================================================

/// Fired from any state when the reader must stop, either because the
/// transport failed (`error` is set) or because nobody listens to the queue
/// anymore.
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub ctx: ReaderContext,
    pub error: Option<Error>,
}

// ExitEvent ===================================================================

/// The last event of the reader. The event loop terminates with an exit
/// status after it.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub ctx: ReaderContext,
    pub with_error: bool,
}

// Events enum =================================================================

#[derive(Debug)]
pub(crate) enum Event {
    SysexStart(SysexStartEvent),
    ShortMessageStart(ShortMessageStartEvent),
    MessageComplete(MessageCompleteEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
