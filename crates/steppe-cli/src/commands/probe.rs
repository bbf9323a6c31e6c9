//! Probe file editing commands.

use super::common::{SegmentOverrides, load_probe, probe_path, probe_sample_rate};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use steppe_config::{Settings, load_segments, save_segments};
use steppe_core::{Probe, Segment, SegmentParameters};
use steppe_io::{WavSpec, write_wav};

#[derive(Args)]
pub struct ProbeArgs {
    #[command(subcommand)]
    command: ProbeCommand,
}

#[derive(Subcommand)]
enum ProbeCommand {
    /// Show the segments of a probe
    Show {
        /// Probe file or saved probe name
        probe: String,
    },

    /// Add a segment built from the settings defaults
    Add {
        /// Probe file (created if missing)
        probe: String,

        /// Insert at this index instead of appending
        #[arg(long)]
        at: Option<usize>,

        #[command(flatten)]
        overrides: SegmentOverrides,
    },

    /// Remove the segment at an index
    Remove {
        /// Probe file or saved probe name
        probe: String,

        /// Index of the segment to remove
        index: usize,
    },

    /// Remove all segments
    Clear {
        /// Probe file or saved probe name
        probe: String,
    },

    /// Render the composite signal to a WAV file
    Render {
        /// Probe file or saved probe name
        probe: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

pub fn run(args: ProbeArgs, settings: &Settings) -> anyhow::Result<()> {
    match args.command {
        ProbeCommand::Show { probe } => {
            let (path, segments) = load_probe(&probe)?;
            let probe = Probe::from_parameters(&segments)?;
            print_probe(&path, &probe);
        }

        ProbeCommand::Add {
            probe,
            at,
            overrides,
        } => {
            let path = probe_path(&probe);
            let segments = if path.exists() {
                load_segments(&path)?
            } else {
                Vec::new()
            };
            let mut probe = Probe::from_parameters(&segments)?;

            let params = overrides.apply(settings.segment_parameters());
            let segment = Segment::new(params)?;
            let frames = segment.len();
            let index = at.unwrap_or(probe.len()).min(probe.len());
            probe.insert(index, segment);

            save_segments(&path, &probe.parameters())?;
            println!(
                "Added segment {} ({} Hz, {} frames) to {}",
                index,
                params.frequency,
                frames,
                path.display()
            );
        }

        ProbeCommand::Remove { probe, index } => {
            let (path, segments) = load_probe(&probe)?;
            let mut probe = Probe::from_parameters(&segments)?;
            let removed = probe.remove(index)?;
            save_segments(&path, &probe.parameters())?;
            println!(
                "Removed segment {} ({} Hz), {} left",
                index,
                removed.params().frequency,
                probe.len()
            );
        }

        ProbeCommand::Clear { probe } => {
            let path = probe_path(&probe);
            save_segments(&path, &[])?;
            println!("Cleared {}", path.display());
        }

        ProbeCommand::Render { probe, output } => {
            let (_, segments) = load_probe(&probe)?;
            let sample_rate = probe_sample_rate(&segments, settings.segment.sample_rate)?;
            let probe = Probe::from_parameters(&segments)?;

            write_wav(&output, probe.composite(), WavSpec::mono_float(sample_rate))?;
            println!(
                "Rendered {} segment(s), {} frames at {} Hz to {}",
                probe.len(),
                probe.total_frames(),
                sample_rate,
                output.display()
            );
        }
    }

    Ok(())
}

fn print_probe(path: &Path, probe: &Probe) {
    println!("Probe: {}", path.display());
    if probe.is_empty() {
        println!("  (no segments)");
        return;
    }

    println!(
        "  {:>3}  {:>6}  {:>6}  {:>5}  {:>6}  {:>6}  {:>6}  {:<14}  {:>5}  {:>5}  {:>8}",
        "#", "fs", "Hz", "sigma", "dur", "start", "stop", "window", "open", "close", "frames"
    );
    for (index, segment) in probe.segments().iter().enumerate() {
        print_segment(index, segment.params(), segment.len());
    }

    let seconds: f64 = probe
        .segments()
        .iter()
        .map(|s| s.len() as f64 / f64::from(s.params().sample_rate))
        .sum();
    println!(
        "\nTotal: {} segment(s), {} frames, {:.3} s",
        probe.len(),
        probe.total_frames(),
        seconds
    );
}

fn print_segment(index: usize, p: &SegmentParameters, frames: usize) {
    println!(
        "  {:>3}  {:>6}  {:>6}  {:>5}  {:>6}  {:>6}  {:>6}  {:<14}  {:>5}  {:>5}  {:>8}",
        index,
        p.sample_rate,
        p.frequency,
        p.sigma,
        p.duration_ms,
        p.start_offset_ms,
        p.stop_offset_ms,
        p.window.name(),
        p.window_open_ms,
        p.window_close_ms,
        frames
    );
}
