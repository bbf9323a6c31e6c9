//! Audio device listing and lookup.

use clap::{Args, Subcommand};
use steppe_io::{AudioDevice, DeviceKind, find_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Resolve a device by index, name or partial name
    Find {
        /// Device index, name or partial name
        query: String,

        /// Look among output devices instead of inputs
        #[arg(long)]
        output: bool,
    },
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs = print_kind(&devices, DeviceKind::Input, "Input Devices:");
            let outputs = print_kind(&devices, DeviceKind::Output, "Output Devices:");

            println!("Total: {} input(s), {} output(s)", inputs, outputs);
            println!();
            println!("Tip: Use device index or partial name with --input/--output:");
            println!("  steppe measure probe.cfg --input 0 --output 0");
            println!("  steppe measure probe.cfg --input \"USB\" --output \"USB\"");
        }

        DevicesCommand::Find { query, output } => {
            let kind = if output {
                DeviceKind::Output
            } else {
                DeviceKind::Input
            };
            let device = find_device(&devices, &query, kind)?;
            println!("{}", device.name);
            println!("  Default sample rate: {} Hz", device.default_sample_rate);
            println!("  Mono 16-bit rates: {}", format_rates(rates(device, kind)));
        }
    }

    Ok(())
}

fn rates(device: &AudioDevice, kind: DeviceKind) -> &[u32] {
    match kind {
        DeviceKind::Input => &device.input_rates,
        DeviceKind::Output => &device.output_rates,
    }
}

fn format_rates(rates: &[u32]) -> String {
    if rates.is_empty() {
        return "none".to_string();
    }
    rates
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_kind(devices: &[AudioDevice], kind: DeviceKind, title: &str) -> usize {
    let matching: Vec<_> = devices
        .iter()
        .filter(|d| match kind {
            DeviceKind::Input => d.is_input,
            DeviceKind::Output => d.is_output,
        })
        .collect();

    if matching.is_empty() {
        return 0;
    }

    println!("{}", title);
    for (idx, device) in matching.iter().enumerate() {
        println!(
            "  [{}] {} ({} Hz; mono 16-bit: {})",
            idx,
            device.name,
            device.default_sample_rate,
            format_rates(rates(device, kind))
        );
    }
    println!();
    matching.len()
}
