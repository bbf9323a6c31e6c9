//! Play a probe or calibration sweep while recording the response.

use super::common::{
    RangeArgs, SweepArgs, View, load_probe, print_peaks, probe_sample_rate, spectrum,
    write_spectrum,
};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use steppe_config::Settings;
use steppe_core::Probe;
use steppe_io::{
    CoordinatorState, CpalBackend, Error as IoError, MeasurementRunner, RunnerConfig,
    write_recording,
};

#[derive(Args)]
pub struct MeasureArgs {
    /// Probe file or saved probe name
    #[arg(value_name = "PROBE", required_unless_present = "sweep")]
    probe: Option<String>,

    /// Play the calibration sweep instead of a probe
    #[arg(long, conflicts_with = "probe")]
    sweep: bool,

    /// Sample rate for the sweep (defaults to the segment sample rate setting)
    #[arg(long)]
    sample_rate: Option<u32>,

    #[command(flatten)]
    sweep_args: SweepArgs,

    /// Input device (index, name, or partial name)
    #[arg(short, long)]
    input: Option<String>,

    /// Output device (index, name, or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Seconds to wait past the expected end before giving up
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Write the recorded response to a WAV file
    #[arg(long, value_name = "WAV")]
    record: Option<PathBuf>,

    /// Write the spectrum (CSV, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    spectrum: Option<PathBuf>,

    /// Spectrum to compute: of the played signal or of the recorded response
    #[arg(long, value_enum, default_value = "response")]
    view: View,

    #[command(flatten)]
    range: RangeArgs,

    /// Show top N peaks
    #[arg(long, default_value = "10")]
    peaks: usize,
}

fn state_label(state: CoordinatorState) -> &'static str {
    match state {
        CoordinatorState::Idle => "idle",
        CoordinatorState::Playing => "playing",
        CoordinatorState::Settling => "settling",
    }
}

pub fn run(args: MeasureArgs, settings: &Settings) -> anyhow::Result<()> {
    let (signal, sample_rate) = if args.sweep {
        let sweep = args.sweep_args.sweep(settings)?;
        let sample_rate = args.sample_rate.unwrap_or(settings.segment.sample_rate);
        println!(
            "Calibration sweep: {} {} Hz -> {} Hz, {} ms",
            sweep.method, sweep.start_hz, sweep.stop_hz, sweep.duration_ms
        );
        (sweep.generate(sample_rate)?, sample_rate)
    } else {
        let name = args.probe.as_deref().unwrap_or_default();
        let (path, segments) = load_probe(name)?;
        let sample_rate = probe_sample_rate(&segments, settings.segment.sample_rate)?;
        let probe = Probe::from_parameters(&segments)?;
        println!("Probe: {} ({} segment(s))", path.display(), probe.len());
        (probe.composite().to_vec(), sample_rate)
    };

    let config = RunnerConfig {
        sample_rate,
        input_device: args.input.or_else(|| settings.devices.input.clone()),
        output_device: args.output.or_else(|| settings.devices.output.clone()),
        buffer_size: args.buffer_size.or(settings.devices.buffer_size),
        timeout_margin: Duration::from_secs(args.timeout),
    };

    println!(
        "  Input:  {}",
        config.input_device.as_deref().unwrap_or("default")
    );
    println!(
        "  Output: {}",
        config.output_device.as_deref().unwrap_or("default")
    );
    println!(
        "  {} frames at {} Hz ({:.2}s)",
        signal.len(),
        sample_rate,
        signal.len() as f64 / f64::from(sample_rate)
    );
    println!("\nPress Ctrl+C to abort...\n");

    let abort = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&abort);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    let pb = ProgressBar::new(signal.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")?
            .progress_chars("##-"),
    );

    let mut runner = MeasurementRunner::new(Box::new(CpalBackend::new()), config);
    let result = runner.run(&signal, &abort, |progress| {
        pb.set_position((progress.captured_frames as u64).min(signal.len() as u64));
        pb.set_message(state_label(progress.state));
    });

    let recording = match result {
        Ok(recording) => {
            pb.finish_with_message("done");
            recording
        }
        Err(IoError::Aborted) => {
            pb.abandon_with_message("aborted");
            println!("\nMeasurement aborted.");
            return Ok(());
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    println!(
        "\nRecorded {} frames ({:.2}s) in session {}",
        recording.samples.len(),
        recording.duration_secs(),
        recording.session
    );
    for error in &recording.device_errors {
        eprintln!("  device error: {}", error);
    }

    if let Some(path) = &args.record {
        write_recording(path, &recording)?;
        println!("Wrote recording to {}", path.display());
    }

    let window = args.range.window(settings);
    let spectrum = match args.view {
        View::Source => spectrum(View::Source, &signal, sample_rate, window),
        View::Response => spectrum(
            View::Response,
            &recording.samples,
            recording.sample_rate,
            window,
        ),
    };

    print_peaks(&spectrum, args.peaks);

    if let Some(path) = &args.spectrum {
        println!();
        write_spectrum(path, &spectrum)?;
    }

    Ok(())
}
