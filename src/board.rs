//! The engine for one board: a background reader plus a controller to send
//! commands.
//!
//! **Example** - Blinking the built-in LED and printing what the board sends:
//! ```no_run
//! use firmcom::{Board, PinMode, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new().path("/dev/ttyACM0").finalize();
//! let board = Board::open(&settings)?;
//! board.set_pin_mode(13, PinMode::Output)?;
//! board.digital_write(13, true)?;
//! while let Ok(Ok(message)) = board.recv() {
//!     println!("{:?}", message);
//! }
//! # Ok::<(), firmcom::Error>(())
//! ```

mod state;

use std::{
    io::{Read, Write},
    ops::Deref,
    sync::{
        mpsc::{self, RecvError},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use hexplay::HexViewBuilder;
use log::{debug, info, log_enabled, trace, Level::Trace};

use crate::error::{Error, Result};
use crate::protocol::{encoder, DecodedMessage, I2cMode, PinMode};
use crate::reader::{self, EventReceiver};
use crate::settings::Settings;
use crate::utils::{open_and_setup_port, BlockingPort};

pub use state::{BoardState, Firmware, PinState};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Lock a mutex, recovering the data if another thread panicked while holding
/// it. Everything guarded here is plain data that stays consistent.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Controller
// =============================================================================

/// Sends commands to the board and reads its cached state.
///
/// Cheap to clone and safe to use from many threads at once. Every command is
/// written as a single frame while holding the writer lock, so frames from
/// concurrent callers never interleave on the wire.
#[derive(Clone)]
pub struct Controller {
    writer: SharedWriter,
    state: Arc<Mutex<BoardState>>,
}

impl Controller {
    pub(crate) fn new(writer: Box<dyn Write + Send>, state: Arc<Mutex<BoardState>>) -> Self {
        Controller {
            writer: Arc::new(Mutex::new(writer)),
            state,
        }
    }

    /// A snapshot of the board state.
    pub fn state(&self) -> BoardState {
        lock(&self.state).clone()
    }

    pub fn set_pin_mode(&self, pin: u8, mode: PinMode) -> Result<()> {
        let mut state = lock(&self.state);
        self.send(&encoder::set_pin_mode(pin, mode))?;
        state.set_pin_mode(pin, mode);
        Ok(())
    }

    /// Drive a digital pin. The whole port is sent, with the other 7 pins at
    /// their cached values.
    pub fn digital_write(&self, pin: u8, high: bool) -> Result<()> {
        // Hold the state lock across the write so that the port bytes reach
        // the wire in the order they were computed.
        let mut state = lock(&self.state);
        let (port, value) = state.port_with(pin, high);
        self.send(&encoder::digital_port(port, value))?;
        state.set_port(port, value);
        Ok(())
    }

    /// Write an analog (PWM, servo) value, 14 bits at most.
    pub fn analog_write(&self, pin: u8, value: u16) -> Result<()> {
        let mut state = lock(&self.state);
        self.send(&encoder::analog_write(pin, value))?;
        state.set_analog(pin, value);
        Ok(())
    }

    /// Start or stop the reporting of an analog pin.
    pub fn report_analog(&self, pin: u8, enable: bool) -> Result<()> {
        self.send(&encoder::report_analog(pin, enable))
    }

    /// Start or stop the reporting of the port `pin` belongs to.
    pub fn report_digital(&self, pin: u8, enable: bool) -> Result<()> {
        self.send(&encoder::report_digital(pin, enable))
    }

    pub fn query_capabilities(&self) -> Result<()> {
        self.send(&encoder::query_capabilities())
    }

    pub fn query_analog_mapping(&self) -> Result<()> {
        self.send(&encoder::query_analog_mapping())
    }

    pub fn query_firmware(&self) -> Result<()> {
        self.send(&encoder::query_firmware())
    }

    pub fn query_pin_state(&self, pin: u8) -> Result<()> {
        self.send(&encoder::query_pin_state(pin))
    }

    /// Must be sent before any I2C request.
    pub fn i2c_config(&self, delay: u16) -> Result<()> {
        self.send(&encoder::i2c_config(delay))
    }

    pub fn set_sampling_interval(&self, interval: u16) -> Result<()> {
        self.send(&encoder::set_sampling_interval(interval))
    }

    /// Send an I2C request to a device with a 7-bit `address`.
    pub fn i2c_request(&self, address: u8, mode: I2cMode, data: &[u8]) -> Result<()> {
        self.send(&encoder::i2c_request(address, mode, data))
    }

    fn send(&self, frame: &[u8]) -> Result<()> {
        let mut writer = lock(&self.writer);
        writer.write_all(frame)?;
        writer.flush()?;
        debug!("sent {:02X?}", frame);
        if log_enabled!(Trace) {
            let view = HexViewBuilder::new(frame).row_width(16).finish();
            trace!("\n{}", view);
        }
        Ok(())
    }
}

// =============================================================================
// Board
// =============================================================================

/// A connected board: owns the reader thread and the queue of received
/// messages, and dereferences to its [`Controller`].
pub struct Board {
    controller: Controller,
    events: EventReceiver,
    reader: JoinHandle<i8>,
    device: Option<String>,
    baud_rate: u32,
}

impl Board {
    /// Open the serial port configured in `settings` and start talking to the
    /// board on it.
    pub fn open(settings: &Settings) -> Result<Board> {
        let path = settings.path.clone().ok_or(Error::NoDevice)?;
        let port = open_and_setup_port(settings)?;
        let reader = BlockingPort::new(port.try_clone()?);
        let writer = BlockingPort::new(port);
        let mut board = Board::with_transport(reader, writer, settings)?;
        board.device = Some(path);
        Ok(board)
    }

    /// Start talking to a board over an already open transport, given as its
    /// reader and writer halves.
    ///
    /// Waits for `settings.startup_delay` (boards commonly reset when the
    /// port opens), starts the reader thread, then queries the capabilities
    /// and analog mapping if `settings.query_on_connect` is set.
    pub fn with_transport<R, W>(input: R, output: W, settings: &Settings) -> Result<Board>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        if !settings.startup_delay.is_zero() {
            debug!("waiting {:?} for the board to start", settings.startup_delay);
            thread::sleep(settings.startup_delay);
        }

        let state = Arc::new(Mutex::new(BoardState::new()));
        let (events_tx, events) = mpsc::sync_channel(settings.event_capacity.max(1));
        let mut frame_reader = reader::factory(Box::new(input), Arc::clone(&state), events_tx);
        let reader = thread::Builder::new()
            .name("firmata-reader".into())
            .spawn(move || frame_reader.run())
            .map_err(Error::Spawn)?;

        let controller = Controller::new(Box::new(output), state);
        if settings.query_on_connect {
            controller.query_capabilities()?;
            controller.query_analog_mapping()?;
        }
        info!("board engine started");

        Ok(Board {
            controller,
            events,
            reader,
            device: None,
            baud_rate: settings.baud_rate,
        })
    }

    /// A controller that can be moved to other threads.
    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    /// The queue of received messages, in wire order. An `Err` is the terminal
    /// failure of the reader and is the last item ever delivered.
    pub fn events(&self) -> &EventReceiver {
        &self.events
    }

    /// Block until the next message. `Err(RecvError)` once the reader has
    /// stopped and the queue is drained.
    pub fn recv(&self) -> std::result::Result<Result<DecodedMessage>, RecvError> {
        self.events.recv()
    }

    /// The serial device in use, when opened with [`Board::open`].
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Drop the queue and wait for the reader to stop. The reader only stops
    /// once the transport fails or closes, or when it next tries to deliver a
    /// message. Returns `0` for a clean stop, `1` on a transport error.
    pub fn join(self) -> i8 {
        let Board { events, reader, .. } = self;
        drop(events);
        reader.join().unwrap_or(1)
    }
}

impl Deref for Board {
    type Target = Controller;

    fn deref(&self) -> &Controller {
        &self.controller
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
