//! Full pipeline demo: the stand-in for a graphical host.
//!
//! Usage:
//!   cargo run --example soundpad -- <vendor_id> <product_id> [id=path ...]
//!
//! Vendor/product ids are hex (e.g. `05f3 030c`); omit them to use the
//! `[device]` section of the settings file. Each `id=path` argument
//! registers a track on the soundboard; with no tracks, resolved actions
//! are only logged.
//!
//! The demo first captures one key in detection mode (the flow a host uses
//! when the user binds a new key), then listens until the device
//! disconnects or the process is interrupted.

use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use keycue::audio::{NullBackend, PlaybackHandler, Soundboard};
use keycue::default_key_name;
use keycue::dispatch::{ActionHandler, Dispatcher};
use keycue::logger::LogHandler;
use keycue::registry::DeviceRegistry;
use keycue::settings::Settings;
use keycue::MappingStore;

fn parse_hex_id(arg: &str) -> u16 {
    u16::from_str_radix(arg.trim_start_matches("0x"), 16).unwrap_or_else(|_| {
        eprintln!("invalid hex id: {arg}");
        exit(2);
    })
}

fn main() {
    env_logger::init();

    let settings = Settings::load_default().unwrap_or_else(|e| {
        log::warn!("settings unreadable, using defaults: {e}");
        Settings::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (vendor_id, product_id, track_args) = match args.as_slice() {
        [vid, pid, rest @ ..] => (parse_hex_id(vid), parse_hex_id(pid), rest.to_vec()),
        [] => match settings.device() {
            Some(dev) => (dev.vendor_id, dev.product_id, Vec::new()),
            None => {
                eprintln!("usage: soundpad <vendor_id> <product_id> [id=path ...]");
                eprintln!("(or configure a [device] section in the settings file)");
                exit(2);
            }
        },
        _ => {
            eprintln!("usage: soundpad <vendor_id> <product_id> [id=path ...]");
            exit(2);
        }
    };

    let registry = DeviceRegistry::new().expect("init HID subsystem");
    let session = match registry.open(vendor_id, product_id) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("cannot open device: {e}");
            exit(1);
        }
    };

    let store = match MappingStore::open(settings.mappings_path()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("cannot load mappings: {e}");
            exit(1);
        }
    };
    println!("Mappings ({}):", store.len());
    for (key, action) in store.entries() {
        println!("  {key} -> {action}");
    }

    let mut board = Soundboard::new(NullBackend::default());
    for arg in &track_args {
        match arg.split_once('=') {
            Some((id, path)) => {
                if let Err(e) = board.load_track(id, path) {
                    eprintln!("skipping track {arg}: {e}");
                }
            }
            None => eprintln!("skipping malformed track argument {arg} (want id=path)"),
        }
    }

    let mut dispatcher =
        Dispatcher::new(session, store).with_poll_timeout(settings.read_timeout());

    println!("Press a key within 5s to preview its canonical name...");
    match dispatcher.detect_next_key(Duration::from_secs(5)) {
        Ok(Some(event)) => println!("  detected {}", default_key_name(event.code)),
        Ok(None) => println!("  no key pressed"),
        Err(e) => {
            eprintln!("detection failed: {e}");
            exit(1);
        }
    }

    let handler: Box<dyn ActionHandler> = if board.tracks().is_empty() {
        println!("No tracks registered; actions will only be logged.");
        Box::new(LogHandler::new())
    } else {
        Box::new(PlaybackHandler::new(board))
    };

    println!("Listening; mapped keys fire actions. Ctrl+C to quit.");
    let handle = dispatcher.spawn(handler);
    let (_dispatcher, result) = handle.join();
    match result {
        Ok(()) => println!("Listener stopped."),
        Err(e) => {
            eprintln!("listener ended: {e}");
            exit(1);
        }
    }
}
