extern crate clap;
use crossbeam_channel::bounded; // stop signal from the Ctrl-C handler
use ctrlc;
use env_logger;
use log::error;

use rp8_core::constants::WORD_MASK;
use rp8_core::{cpu, memory};

mod report;

/// Configures the command-line interface using clap
fn get_cli_config<'a>() -> clap::ArgMatches<'a> {
    let description = "Cycle-counting PDP-8 simulator with a floating-point coprocessor";
    clap::App::new("RP8")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("image")
                .index(1)
                .help("Memory image of whitespace-separated hex words (default pdp8.mem)"),
        )
        .arg(
            clap::Arg::with_name("start")
                .long("start")
                .takes_value(true)
                .help("Octal start address (default 200)"),
        )
        .arg(
            clap::Arg::with_name("switches")
                .long("switches")
                .short("s")
                .takes_value(true)
                .help("Octal value for the front-panel switch register"),
        )
        .arg(
            clap::Arg::with_name("limit")
                .long("limit")
                .takes_value(true)
                .help("Stop after this many instructions"),
        )
        .arg(
            clap::Arg::with_name("demo")
                .long("demo")
                .conflicts_with("image")
                .help("Run the built-in add-two-constants sample"),
        )
        .get_matches()
}

/// Main entry point for the simulator
fn main() {
    env_logger::init();

    // Let Ctrl-C stop a guest that never halts; the report still prints
    let (signal_sender, signal_receiver) = bounded(1);
    let handler_result = ctrlc::set_handler(move || {
        if signal_sender.is_full() {
            std::process::exit(-1); // Emergency exit if already signalled
        }
        let _ = signal_sender.send(());
    });

    if let Err(e) = handler_result {
        error!("signal handler failed: {:?}", e);
        return;
    }

    let matches = get_cli_config();

    let image_text = if matches.is_present("demo") {
        String::from(rp8_images::ADD_CONSTANTS)
    } else {
        let path = matches.value_of("image").unwrap_or("pdp8.mem");
        match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!("cannot read memory image {}: {}", path, e);
                return;
            }
        }
    };

    let mut mem = memory::Memory::new();
    match mem.load_image(&image_text) {
        Ok(words) => log::debug!("loaded {} words", words),
        Err(e) => {
            error!("memory image rejected: {}", e);
            return;
        }
    }

    let mut pdp_cpu = cpu::Cpu::new(mem);

    if let Some(text) = matches.value_of("start") {
        match u16::from_str_radix(text, 8) {
            Ok(address) => pdp_cpu.pc = address & WORD_MASK,
            Err(_) => {
                error!("bad octal start address '{}'", text);
                return;
            }
        }
    }

    if let Some(text) = matches.value_of("switches") {
        match u16::from_str_radix(text, 8) {
            Ok(value) => pdp_cpu.sr = value & WORD_MASK,
            Err(_) => {
                error!("bad octal switch value '{}'", text);
                return;
            }
        }
    }

    let limit = match matches.value_of("limit") {
        Some(text) => match text.parse::<u64>() {
            Ok(cap) => Some(cap),
            Err(_) => {
                error!("bad instruction limit '{}'", text);
                return;
            }
        },
        None => None,
    };

    report::print_memory(&pdp_cpu.mem);

    // Main simulation loop: one instruction per iteration until the
    // guest halts, the safety cap trips, or the operator interrupts
    let mut executed: u64 = 0;
    while pdp_cpu.running {
        if !signal_receiver.is_empty() {
            error!("interrupted at {:04o} after {} instructions", pdp_cpu.pc, executed);
            break;
        }

        pdp_cpu.step();
        executed += 1;

        if let Some(cap) = limit {
            if executed >= cap && pdp_cpu.running {
                error!("instruction limit of {} reached at {:04o}", cap, pdp_cpu.pc);
                break;
            }
        }
    }

    report::print_summary(&pdp_cpu.counters);
}
