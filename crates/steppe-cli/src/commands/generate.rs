//! Test signal generation command.

use super::common::{SegmentOverrides, SweepArgs};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use steppe_config::Settings;
use steppe_core::synthesize;
use steppe_io::{WavSpec, write_wav};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate a calibration sweep
    Sweep {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Sample rate (defaults to the segment sample rate setting)
        #[arg(long)]
        sample_rate: Option<u32>,

        #[command(flatten)]
        sweep: SweepArgs,
    },

    /// Generate a single tone-burst segment
    Segment {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        overrides: SegmentOverrides,
    },
}

pub fn run(args: GenerateArgs, settings: &Settings) -> anyhow::Result<()> {
    match args.command {
        GenerateCommand::Sweep {
            output,
            sample_rate,
            sweep,
        } => {
            let sweep = sweep.sweep(settings)?;
            let sample_rate = sample_rate.unwrap_or(settings.segment.sample_rate);

            println!(
                "Generating {} sweep: {} Hz -> {} Hz, {} ms",
                sweep.method, sweep.start_hz, sweep.stop_hz, sweep.duration_ms
            );

            let samples = sweep.generate(sample_rate)?;
            write_wav(&output, &samples, WavSpec::mono_float(sample_rate))?;
            println!("Wrote {} frames to {}", samples.len(), output.display());
        }

        GenerateCommand::Segment { output, overrides } => {
            let params = overrides.apply(settings.segment_parameters());

            println!(
                "Generating {} Hz segment: {} ms, {} window",
                params.frequency,
                params.duration_ms,
                params.window.name()
            );

            let samples = synthesize(&params)?;
            write_wav(&output, &samples, WavSpec::mono_float(params.sample_rate))?;
            println!("Wrote {} frames to {}", samples.len(), output.display());
        }
    }

    Ok(())
}
