//! Spectral analysis of recorded or rendered files.

use super::common::{RangeArgs, View, print_peaks, spectrum, write_spectrum};
use clap::Args;
use std::path::PathBuf;
use steppe_config::Settings;
use steppe_io::read_wav;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Spectrum to compute
    #[arg(long, value_enum, default_value = "response")]
    view: View,

    #[command(flatten)]
    range: RangeArgs,

    /// Output file (CSV, or JSON with a .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show top N peaks
    #[arg(long, default_value = "10")]
    peaks: usize,
}

pub fn run(args: AnalyzeArgs, settings: &Settings) -> anyhow::Result<()> {
    println!("Analyzing {}...", args.input.display());

    let (samples, spec) = read_wav(&args.input)?;
    println!(
        "  {} samples, {} Hz, {:.2}s",
        samples.len(),
        spec.sample_rate,
        samples.len() as f64 / f64::from(spec.sample_rate.max(1))
    );

    let window = args.range.window(settings);
    if matches!(args.view, View::Response) {
        let range = window.frame_range(samples.len(), spec.sample_rate);
        println!("  Analysis range: frames {}..{}", range.start, range.end);
    }

    let spectrum = spectrum(args.view, &samples, spec.sample_rate, window);
    println!("  {} bins", spectrum.len());

    print_peaks(&spectrum, args.peaks);

    if let Some(path) = args.output {
        println!();
        write_spectrum(&path, &spectrum)?;
    }

    Ok(())
}
