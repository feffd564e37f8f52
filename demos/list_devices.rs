//! Enumerate every HID interface on the bus.
//!
//! Run with `cargo run --example list_devices`. Set `RUST_LOG=debug` for
//! enumeration diagnostics.

use keycue::registry::DeviceRegistry;

fn main() {
    env_logger::init();

    let mut registry = DeviceRegistry::new().expect("init HID subsystem");
    let devices = registry.enumerate();

    if devices.is_empty() {
        println!("No HID devices present.");
        return;
    }

    println!("Found {} HID interface(s):", devices.len());
    for descriptor in &devices {
        match &descriptor.serial_number {
            Some(serial) => println!("  {descriptor}  serial={serial}  path={}", descriptor.path),
            None => println!("  {descriptor}  path={}", descriptor.path),
        }
    }
}
