//! Firmcom command line interface.

use std::{process, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, values_t, App,
    AppSettings::*, Arg,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, trace, LevelFilter};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use simplelog::*;

use firmcom::{self as fc, Board, DecodedMessage};

fn main() {
    println!("[FC] firmcom v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        process::exit(0);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Firmcom connects to a board running a Firmata firmware over a \
            serial port. It asks the board for its firmware, the capabilities \
            of its pins and its analog mapping, prints them, then prints every \
            message the board sends until the connection is lost.\n\
            \n\
            Use --report-analog and --report-digital to have the board stream \
            pin values, and --sampling-interval to set how often it samples \
            them.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the tty device the board is connected to")
                .long_help(
                    "the tty device the board is connected to; when not set, \
                     the list of connected serial devices is presented for \
                     selection.",
                )
                .short("-t")
                .long("--tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .short("-b")
                .long("--baud-rate")
                .takes_value(true)
                .default_value("57600")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .short("-d")
                .long("--data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .short("-s")
                .long("--stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .short("-p")
                .long("--parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("flow control mode")
                .short("-f")
                .long("--flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("REPORT_ANALOG")
                .help("analog pin to report, may be repeated")
                .short("-a")
                .long("--report-analog")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("REPORT_DIGITAL")
                .help("digital pin whose port to report, may be repeated")
                .short("-g")
                .long("--report-digital")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("SAMPLING_INTERVAL")
                .help("sampling interval of the board in milliseconds")
                .short("-i")
                .long("--sampling-interval")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'firmcom -v -v -v' or 'firmcom -vvv' vs 'firmcom -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32).unwrap_or_else(|_| {
        invalid_value("baud-rate", matches.value_of("BAUD_RATE").unwrap_or_default())
    });

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    // END - Arguments with default values =====================================

    let mut settings = fc::SettingsBuilder::default()
        .baud_rate(baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .finalize();

    // START - Arguments with NO default values ================================

    settings.path = match matches.value_of("DEVICE_TTY") {
        Some(path) => Some(path.into()),
        None => fc::utils::select_port(),
    };
    if settings.path.is_none() {
        println!("{}: no serial port to connect to", style("error").red());
        process::exit(-1);
    }

    let report_analog = if matches.is_present("REPORT_ANALOG") {
        values_t!(matches.values_of("REPORT_ANALOG"), u8)
            .unwrap_or_else(|_| invalid_value("report-analog", "not a pin number"))
    } else {
        vec![]
    };

    let report_digital = if matches.is_present("REPORT_DIGITAL") {
        values_t!(matches.values_of("REPORT_DIGITAL"), u8)
            .unwrap_or_else(|_| invalid_value("report-digital", "not a pin number"))
    } else {
        vec![]
    };

    let sampling_interval = if matches.is_present("SAMPLING_INTERVAL") {
        Some(
            value_t!(matches.value_of("SAMPLING_INTERVAL"), u16).unwrap_or_else(|_| {
                invalid_value(
                    "sampling-interval",
                    matches.value_of("SAMPLING_INTERVAL").unwrap_or_default(),
                )
            }),
        )
    } else {
        None
    };

    // END - Arguments =========================================================

    let board = match Board::open(&settings) {
        Ok(board) => board,
        Err(e) => {
            println!("{}", style(format!("[FC] 💥 {}", e)).red());
            process::exit(1);
        }
    };

    let exit_code = match monitor(board, &report_analog, &report_digital, sampling_interval) {
        Ok(code) => code,
        Err(e) => {
            println!("{}", style(format!("[FC] 💥 {}", e)).red());
            1
        }
    };
    debug!("exit code: {}", exit_code);
    std::process::exit(exit_code.into());
}

/// Print the board description, enable the requested reporting, then print
/// every message until the reader stops.
fn monitor(
    board: Board,
    report_analog: &[u8],
    report_digital: &[u8],
    sampling_interval: Option<u16>,
) -> fc::Result<i8> {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(120);
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
            .template("[FC] {spinner:.blue} {msg}"),
    );
    pb.set_message(format!(
        "⌛ Waiting for the firmware of {}...",
        style(board.device().unwrap_or("?")).cyan()
    ));
    board.query_firmware()?;

    if let Some(interval) = sampling_interval {
        board.set_sampling_interval(interval)?;
    }
    for pin in report_analog {
        board.report_analog(*pin, true)?;
    }
    for pin in report_digital {
        board.report_digital(*pin, true)?;
    }

    while let Ok(event) = board.recv() {
        let message = match event {
            Ok(message) => message,
            Err(e) => {
                pb.finish_and_clear();
                println!("{}", style(format!("[FC] 💥 {}", e)).red());
                println!("[FC] 🔌 Check the connection to the board!");
                break;
            }
        };
        match &message {
            DecodedMessage::FirmwareReport { major, minor, name } => {
                pb.finish_with_message(format!(
                    "👍 {} v{}.{} at {} baud",
                    style(name).green(),
                    major,
                    minor,
                    board.baud_rate()
                ));
            }
            DecodedMessage::CapabilityReport { pins } => {
                println!("[FC] {} pins:", pins.len());
                for (pin, caps) in pins.iter().enumerate() {
                    let modes: Vec<String> = caps
                        .iter()
                        .map(|c| format!("{}({})", c.mode, c.resolution))
                        .collect();
                    println!("       {:>3}: {}", pin, modes.join(" "));
                }
            }
            DecodedMessage::AnalogMappingReport { mapping } => {
                let mapped: Vec<String> = mapping
                    .iter()
                    .enumerate()
                    .filter_map(|(pin, ch)| ch.map(|ch| format!("{}=A{}", pin, ch)))
                    .collect();
                println!("[FC] analog: {}", mapped.join(" "));
            }
            DecodedMessage::AnalogValue { pin, value } => {
                println!("[FC] A{:<2} {}", pin, style(value).cyan());
            }
            DecodedMessage::DigitalPortValue { port, value } => {
                println!("[FC] P{:<2} {}", port, style(format!("{:08b}", value)).cyan());
            }
            other => println!("[FC] {}", style(format!("{:?}", other)).dim()),
        }
    }

    Ok(board.join())
}

fn invalid_value(name: &str, value: &str) -> ! {
    println!(
        "{}: `{}` needs to be a numeric value",
        style("error").red(),
        style(name).cyan()
    );
    println!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(value).on_red()
    );
    process::exit(-1);
}
