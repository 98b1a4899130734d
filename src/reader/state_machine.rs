//! `firmcom` frame reader state machine.
//!
//! Bytes are read one at a time from `Idle`. A `START_SYSEX` byte opens a
//! sysex message that runs to `END_SYSEX`. Any other byte is the status of a
//! short message followed by exactly two data bytes. A complete message is
//! decoded, applied to the board state and queued before going back to `Idle`.
//!
//! ```text
//!                          START
//!                            |
//!                            v
//!                       .--------.
//!         .------------>|  Idle  |<-------------.
//!         |             '--------'              |
//!         |    START_SYSEX |    | other byte    |
//!         |                v    v               |
//!  message     .---------.       .-----------.     message
//!  complete <--| InSysex |       | InShort   |--> complete
//!              '---------'       | Message   |
//!                   |            '-----------'
//!                   |  transport      |
//!                   |  error          |
//!                   v                 v
//!                 ***********************
//!                 *        Done         *--> END
//!                 ***********************
//! ```
//!
//! `Idle` also goes to `Done` on a transport error, and every state goes to
//! `Done` without error when the queue has no receiver anymore.

use std::{
    io::Read,
    sync::{Arc, Mutex},
};

use super::events::*;
use super::states::*;
use super::EventSender;
use crate::board::BoardState;

// =============================================================================
// Public Interface
// =============================================================================

/// The frame reader. Use the [`factory()`] function to get an instance then
/// run it by calling its [`run()`](FrameReader::run) method.
pub(crate) struct FrameReader {
    sm: Option<ReaderStates>,
}
impl FrameReader {
    /// The reader event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. It then returns **`0`** if the reader stopped
    /// because the queue was closed, or **`1`** after a transport error.
    pub fn run(&mut self) -> i8 {
        while let Some(sm) = self.sm.take() {
            let next = sm.step();
            let status = next.exit_status();
            self.sm = Some(next);
            if let Some(status) = status {
                return status;
            }
        }
        1
    }

    #[cfg(test)]
    fn step(&mut self) {
        if let Some(sm) = self.sm.take() {
            self.sm = Some(sm.step());
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        matches!(self.sm, Some(ReaderStates::Idle(_)))
    }
}

/// Factory function for the frame reader. The reader starts in `Idle`, reads
/// from `transport`, keeps `board` up to date and queues messages on `events`.
pub(crate) fn factory(
    transport: Box<dyn Read + Send>,
    board: Arc<Mutex<BoardState>>,
    events: EventSender,
) -> FrameReader {
    FrameReader {
        sm: Some(ReaderStates::Idle(ReaderSM::new(ReaderContext {
            transport,
            board,
            events,
        }))),
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine: the shared context plus the current state.
#[derive(Debug)]
struct ReaderSM<S: Runnable> {
    ctx: ReaderContext,
    state: S,
}
impl<S: Runnable> ReaderSM<S> {
    fn run(self) -> Event {
        self.state.run(self.ctx)
    }
}

/// The state machine starts in the `IdleState`.
impl ReaderSM<IdleState> {
    fn new(ctx: ReaderContext) -> Self {
        ReaderSM {
            ctx,
            state: IdleState {},
        }
    }
}

enum ReaderStates {
    Idle(ReaderSM<IdleState>),
    InSysex(ReaderSM<InSysexState>),
    InShortMessage(ReaderSM<InShortMessageState>),
    Done(ReaderSM<DoneState>),
}
impl ReaderStates {
    /// The unit of work in the event loop: run the current state and follow
    /// the transition requested by the event it fires.
    fn step(self) -> Self {
        match self {
            ReaderStates::Idle(sm) => match sm.run() {
                Event::SysexStart(ev) => ReaderStates::InSysex(ev.into()),
                Event::ShortMessageStart(ev) => ReaderStates::InShortMessage(ev.into()),
                Event::Done(ev) => ReaderStates::Done(ev.into()),
                event => unreachable!("illegal event {:#?} at state Idle", event),
            },
            ReaderStates::InSysex(sm) => match sm.run() {
                Event::MessageComplete(ev) => ReaderStates::Idle(ev.into()),
                Event::Done(ev) => ReaderStates::Done(ev.into()),
                event => unreachable!("illegal event {:#?} at state InSysex", event),
            },
            ReaderStates::InShortMessage(sm) => match sm.run() {
                Event::MessageComplete(ev) => ReaderStates::Idle(ev.into()),
                Event::Done(ev) => ReaderStates::Done(ev.into()),
                event => unreachable!("illegal event {:#?} at state InShortMessage", event),
            },
            ReaderStates::Done(sm) => match sm.run() {
                Event::Exit(ev) => ReaderStates::Done(ev.into()),
                event => unreachable!("illegal event {:#?} at state Done", event),
            },
        }
    }

    fn exit_status(&self) -> Option<i8> {
        match self {
            ReaderStates::Done(sm) if sm.state.should_exit => {
                Some(if sm.state.with_error { 1 } else { 0 })
            }
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<SysexStartEvent> for ReaderSM<InSysexState> {
    fn from(event: SysexStartEvent) -> ReaderSM<InSysexState> {
        ReaderSM {
            ctx: event.ctx,
            state: InSysexState { data: Vec::new() },
        }
    }
}

impl From<ShortMessageStartEvent> for ReaderSM<InShortMessageState> {
    fn from(event: ShortMessageStartEvent) -> ReaderSM<InShortMessageState> {
        ReaderSM {
            ctx: event.ctx,
            state: InShortMessageState {
                status: event.status,
            },
        }
    }
}

impl From<MessageCompleteEvent> for ReaderSM<IdleState> {
    fn from(event: MessageCompleteEvent) -> ReaderSM<IdleState> {
        ReaderSM::new(event.ctx)
    }
}

impl From<DoneEvent> for ReaderSM<DoneState> {
    fn from(event: DoneEvent) -> ReaderSM<DoneState> {
        ReaderSM {
            ctx: event.ctx,
            state: DoneState {
                with_error: event.error.is_some(),
                error: event.error,
                should_exit: false,
            },
        }
    }
}
impl From<ExitEvent> for ReaderSM<DoneState> {
    fn from(event: ExitEvent) -> ReaderSM<DoneState> {
        ReaderSM {
            ctx: event.ctx,
            state: DoneState {
                error: None,
                with_error: event.with_error,
                should_exit: true,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::protocol::{Capability, DecodedMessage, PinMode};
    use std::io::{self, Cursor};
    use std::sync::mpsc::{self, Receiver, TryRecvError};

    /// Hands out its bytes, then fails like an unplugged cable.
    struct Unplugged(Cursor<Vec<u8>>);

    impl Read for Unplugged {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "device unplugged")),
                n => Ok(n),
            }
        }
    }

    fn reader_over<R: Read + Send + 'static>(
        transport: R,
    ) -> (
        FrameReader,
        Arc<Mutex<BoardState>>,
        Receiver<Result<DecodedMessage>>,
    ) {
        let board = Arc::new(Mutex::new(BoardState::new()));
        let (tx, rx) = mpsc::sync_channel(16);
        let reader = factory(Box::new(transport), Arc::clone(&board), tx);
        (reader, board, rx)
    }

    fn drain(rx: &Receiver<Result<DecodedMessage>>) -> Vec<Result<DecodedMessage>> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    #[test]
    fn sysex_frame_yields_one_message_and_returns_to_idle() {
        let bytes: Vec<u8> = vec![0xF0, 0x6C, 0x00, 0x01, 127, 0xF7];
        let (mut reader, board, rx) = reader_over(Cursor::new(bytes));

        reader.step();
        assert!(!reader.is_idle());
        reader.step();
        assert!(reader.is_idle());

        let expected = vec![vec![Capability {
            mode: PinMode::Input,
            resolution: 1,
        }]];
        match rx.try_recv() {
            Ok(Ok(DecodedMessage::CapabilityReport { pins })) => assert_eq!(pins, expected),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(board.lock().unwrap().capabilities(), Some(&expected[..]));
    }

    #[test]
    fn short_messages_are_three_bytes() {
        let bytes: Vec<u8> = vec![0xE3, 0x7F, 0x01, 0xF9, 0x02, 0x05, 0x92, 0x01, 0x00];
        let (mut reader, board, rx) = reader_over(Cursor::new(bytes));
        assert_eq!(reader.run(), 1);

        let items = drain(&rx);
        assert_eq!(items.len(), 4);
        assert_eq!(
            items[0].as_ref().unwrap(),
            &DecodedMessage::AnalogValue { pin: 3, value: 255 }
        );
        assert_eq!(
            items[1].as_ref().unwrap(),
            &DecodedMessage::ProtocolVersion { major: 2, minor: 5 }
        );
        assert_eq!(
            items[2].as_ref().unwrap(),
            &DecodedMessage::DigitalPortValue { port: 2, value: 1 }
        );
        assert!(matches!(items[3], Err(Error::Io(_))));

        let board = board.lock().unwrap();
        assert_eq!(board.analog_value(3), 255);
        assert_eq!(board.protocol_version(), Some((2, 5)));
        assert!(board.digital_value(16));
    }

    #[test]
    fn messages_keep_wire_order() {
        let bytes: Vec<u8> = vec![
            0xF0, 0x79, 0x02, 0x05, b'F', 0x00, 0xF7, // firmware
            0xE1, 0x00, 0x01, // analog
            0xF0, 0x42, 0x01, 0xF7, // unknown sysex
            0xF0, 0xF7, // empty sysex
        ];
        let (mut reader, _board, rx) = reader_over(Cursor::new(bytes));
        assert_eq!(reader.run(), 1);

        let items: Vec<_> = drain(&rx).into_iter().filter_map(|i| i.ok()).collect();
        assert_eq!(
            items,
            vec![
                DecodedMessage::FirmwareReport {
                    major: 2,
                    minor: 5,
                    name: "F".into(),
                },
                DecodedMessage::AnalogValue { pin: 1, value: 128 },
                DecodedMessage::Unknown {
                    raw: vec![0x42, 0x01],
                },
                DecodedMessage::Unknown { raw: vec![] },
            ]
        );
    }

    #[test]
    fn failure_mid_sysex_is_reported_once_without_partial_message() {
        let transport = Unplugged(Cursor::new(vec![0xF0, 0x6C, 0x00]));
        let (mut reader, board, rx) = reader_over(transport);
        assert_eq!(reader.run(), 1);
        drop(reader);

        let items = drain(&rx);
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(Error::Truncated { message, source }) => {
                assert_eq!(*message, "sysex");
                assert_eq!(source.kind(), io::ErrorKind::Other);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(board.lock().unwrap().capabilities(), None);
    }

    #[test]
    fn failure_mid_short_message_is_truncated() {
        let (mut reader, _board, rx) = reader_over(Cursor::new(vec![0xE0u8, 0x01]));
        assert_eq!(reader.run(), 1);

        let items = drain(&rx);
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(Error::Truncated {
                message: "short message",
                ..
            })
        ));
    }

    #[test]
    fn failure_between_messages_is_an_io_error() {
        let transport = Unplugged(Cursor::new(vec![0xF9, 0x02, 0x05]));
        let (mut reader, _board, rx) = reader_over(transport);
        assert_eq!(reader.run(), 1);

        let items = drain(&rx);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(Error::Io(_))));
    }

    #[test]
    fn closed_queue_stops_the_reader_cleanly() {
        let bytes: Vec<u8> = vec![0xE0, 0x10, 0x00, 0xE1, 0x10, 0x00];
        let (mut reader, board, rx) = reader_over(Cursor::new(bytes));
        drop(rx);
        assert_eq!(reader.run(), 0);
        // The first message was still applied before the queue was found closed.
        let board = board.lock().unwrap();
        assert_eq!(board.analog_value(0), 16);
        assert_eq!(board.analog_value(1), 0);
    }

    #[test]
    fn run_after_exit_returns_immediately() {
        let (mut reader, _board, rx) = reader_over(Cursor::new(Vec::<u8>::new()));
        assert_eq!(reader.run(), 1);
        assert_eq!(reader.run(), 1);
        assert_eq!(drain(&rx).len(), 1);
    }
}
