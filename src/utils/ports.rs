//! Serial port device manipulation.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use console::Term;
use log::{debug, info, warn};
use serialport::{available_ports, SerialPort, SerialPortType};

use crate::Settings;

/// Read timeout configured on the port. Reads never give up, the timeout only
/// bounds how long a single system call blocks.
const READ_POLL: Duration = Duration::from_millis(500);

//==============================================================================
// Public Interface
//==============================================================================

/// Open the serial port named in `settings` and configure it. There is no
/// retry: if the device is not there, the error is returned right away.
pub fn open_and_setup_port(settings: &Settings) -> Result<Box<dyn SerialPort>, serialport::Error> {
    let path = settings.path.clone().ok_or_else(|| {
        serialport::Error::new(serialport::ErrorKind::NoDevice, "no serial port path configured")
    })?;
    debug!("opening {}", path);
    let mut port = serialport::new(&path, settings.baud_rate)
        .data_bits(settings.data_bits)
        .stop_bits(settings.stop_bits)
        .parity(settings.parity)
        .flow_control(settings.flow_control)
        .timeout(READ_POLL)
        .open()?;

    // Configure the port with the values in `settings`, some drivers ignore
    // what was given at open time.
    port.set_baud_rate(settings.baud_rate)?;
    port.set_data_bits(settings.data_bits)?;
    port.set_stop_bits(settings.stop_bits)?;
    port.set_parity(settings.parity)?;
    port.set_flow_control(settings.flow_control)?;

    let baud_rate = port.baud_rate()?;
    info!(
        "Connected to {} at {} baud",
        port.name().unwrap_or(path),
        baud_rate
    );
    debug!("data_bits    : {:#?}", port.data_bits()?);
    debug!("stop_bits    : {:#?}", port.stop_bits()?);
    debug!("parity       : {:#?}", port.parity()?);
    debug!("flow control : {:#?}", port.flow_control()?);

    if baud_rate != settings.baud_rate {
        return Err(serialport::Error::new(
            serialport::ErrorKind::InvalidInput,
            format!(
                "failed to set the baud rate to {} (port reports {}), it is probably not a \
                 valid one for this device",
                settings.baud_rate, baud_rate
            ),
        ));
    }

    Ok(port)
}

/// A serial port seen as a plain blocking byte stream.
///
/// Reads wait as long as it takes for data to arrive; the port's own read
/// timeout is never surfaced. Any other error is returned as is.
pub struct BlockingPort {
    port: Box<dyn SerialPort>,
}
impl BlockingPort {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        BlockingPort { port }
    }
}
impl Read for BlockingPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.port.read(buf) {
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => continue,
                result => return result,
            }
        }
    }
}
impl Write for BlockingPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

/// Enumerates serial devices on the system, with the manufacturer and product
/// of USB ones appended after a `:`.
pub fn enumerate_serial_ports() -> Vec<String> {
    let mut found = vec![];
    match available_ports() {
        Ok(ports) => {
            for p in ports {
                match p.port_type {
                    // USB ports give us more info about the connected board
                    SerialPortType::UsbPort(info) => {
                        let extended_name = format!(
                            "{}: ({} / {})",
                            p.port_name,
                            info.manufacturer.as_ref().map_or("", String::as_str),
                            info.product.as_ref().map_or("", String::as_str)
                        );
                        found.push(extended_name);
                    }
                    // We're also interested in the other devices, such as
                    // virtual ports for testing
                    _ => {
                        found.push(p.port_name);
                    }
                }
            }
        }
        Err(ref e) => {
            info!("error: {}", e.to_string());
        }
    }
    found
}

/// Present the connected serial devices to the user and return the path of
/// the selected one, or `None` when there is none or the user cancels.
pub fn select_port() -> Option<String> {
    use dialoguer::{theme::ColorfulTheme, Select};

    let ports = enumerate_serial_ports();
    if ports.is_empty() {
        warn!("no serial port found");
        return None;
    }

    let term = Term::buffered_stderr();
    let theme = ColorfulTheme::default();

    let mut select = Select::with_theme(&theme);
    select.with_prompt("Select the port the board is connected to");
    for item in &ports {
        select.item(item);
    }

    let selection = select.default(0).interact_on_opt(&term).ok().flatten();
    selection
        .and_then(|x| ports.get(x))
        .and_then(|item| item.split(':').next())
        .map(String::from)
}

//==============================================================================
// Unit Tests
//==============================================================================
