//! Integration tests for the CDC serial transport.
//!
//! Run against a device whose firmware echoes every byte it reads from the
//! CDC port back to the host. The echo loop is shown in the `cdc_serial`
//! crate documentation.

mod device;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use device::{bootloader_touch, resolve_port, wait_for_disconnect, DeviceClient};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the CDC serial transport")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Only perform the 1200 baud bootloader touch and exit
    #[arg(long)]
    touch: bool,

    /// Finish the test run with the bootloader touch (device resets)
    #[arg(long)]
    with_touch: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    if args.touch {
        println!("Touching {} at 1200 baud...", port);
        bootloader_touch(&port)?;
        wait_for_disconnect(&port, Duration::from_secs(3))?;
        println!("{}", "Device reset into bootloader".green());
        return Ok(());
    }

    println!("{}", "CDC Serial Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, args.baud)?;

    // The device reports the port closed for a short while after boot
    std::thread::sleep(Duration::from_millis(600));
    device.drain_buffer()?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device, args.with_touch);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
