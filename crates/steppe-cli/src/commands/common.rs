//! Shared CLI helpers used across multiple commands.

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use steppe_analysis::{AnalysisWindow, Spectrum, SpectrumAnalyzer, Sweep, SweepMethod};
use steppe_config::{Settings, find_probe, load_segments};
use steppe_core::{SegmentParameters, WindowKind};

/// Per-field overrides applied on top of the segment defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct SegmentOverrides {
    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Tone frequency in Hz
    #[arg(long)]
    pub hertz: Option<u32>,

    /// Gaussian window width
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Flat region length in ms
    #[arg(long, value_name = "MS")]
    pub duration: Option<u32>,

    /// Leading silence in ms
    #[arg(long, value_name = "MS")]
    pub start_offset: Option<u32>,

    /// Trailing silence in ms
    #[arg(long, value_name = "MS")]
    pub stop_offset: Option<u32>,

    /// Taper window (blackmanharris, bartlett, boxcar, cosine, hann, gaussian, tukey)
    #[arg(long)]
    pub window: Option<WindowKind>,

    /// Opening taper length in ms
    #[arg(long, value_name = "MS")]
    pub window_open: Option<u32>,

    /// Closing taper length in ms
    #[arg(long, value_name = "MS")]
    pub window_close: Option<u32>,
}

impl SegmentOverrides {
    /// Replace the fields of `base` that were given on the command line.
    pub fn apply(&self, base: SegmentParameters) -> SegmentParameters {
        SegmentParameters {
            sample_rate: self.sample_rate.unwrap_or(base.sample_rate),
            frequency: self.hertz.unwrap_or(base.frequency),
            sigma: self.sigma.unwrap_or(base.sigma),
            duration_ms: self.duration.unwrap_or(base.duration_ms),
            start_offset_ms: self.start_offset.unwrap_or(base.start_offset_ms),
            stop_offset_ms: self.stop_offset.unwrap_or(base.stop_offset_ms),
            window: self.window.unwrap_or(base.window),
            window_open_ms: self.window_open.unwrap_or(base.window_open_ms),
            window_close_ms: self.window_close.unwrap_or(base.window_close_ms),
        }
    }
}

/// Calibration sweep options; unset fields come from the settings.
#[derive(Args, Debug, Default, Clone)]
pub struct SweepArgs {
    /// Sweep law (linear, logarithmic, hyperbolic)
    #[arg(long)]
    pub method: Option<SweepMethod>,

    /// Sweep length in ms
    #[arg(long, value_name = "MS")]
    pub sweep_duration: Option<u32>,

    /// Start frequency in Hz
    #[arg(long)]
    pub start_hz: Option<f64>,

    /// Stop frequency in Hz
    #[arg(long)]
    pub stop_hz: Option<f64>,
}

impl SweepArgs {
    /// Build the sweep from the settings, then the command-line overrides.
    pub fn sweep(&self, settings: &Settings) -> anyhow::Result<Sweep> {
        let calibration = &settings.calibration;
        let method = match self.method {
            Some(method) => method,
            None => calibration.method.parse::<SweepMethod>()?,
        };

        Ok(Sweep {
            method,
            duration_ms: self.sweep_duration.unwrap_or(calibration.duration_ms),
            start_hz: self.start_hz.unwrap_or(calibration.start_hz),
            stop_hz: self.stop_hz.unwrap_or(calibration.stop_hz),
        })
    }
}

/// Analysis range options; unset bounds come from the settings.
#[derive(Args, Debug, Default, Clone)]
pub struct RangeArgs {
    /// Start of the analyzed range in ms
    #[arg(long, value_name = "MS")]
    pub start_ms: Option<i64>,

    /// End of the analyzed range in ms, negative for the end of the capture
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub stop_ms: Option<i64>,
}

impl RangeArgs {
    /// Resolve the analysis window.
    pub fn window(&self, settings: &Settings) -> AnalysisWindow {
        AnalysisWindow::from_signed(
            self.start_ms.unwrap_or(settings.analysis.start_ms),
            self.stop_ms.unwrap_or(settings.analysis.stop_ms),
        )
    }
}

/// Which spectrum to compute.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum View {
    /// Raw spectrum of the whole signal
    Source,
    /// Hann-windowed spectrum of the analysis range
    #[default]
    Response,
}

/// Compute the spectrum of `samples` for the chosen view.
pub fn spectrum(view: View, samples: &[f32], sample_rate: u32, window: AnalysisWindow) -> Spectrum {
    let mut analyzer = SpectrumAnalyzer::new(sample_rate);
    match view {
        View::Source => analyzer.source(samples),
        View::Response => analyzer.response(samples, window),
    }
}

/// Print the `n` strongest bins.
pub fn print_peaks(spectrum: &Spectrum, n: usize) {
    if n == 0 || spectrum.is_empty() {
        return;
    }

    println!("\nTop {} frequency peaks:", n);
    println!("  {:>10}  {:>12}", "Freq (Hz)", "Magnitude");
    println!("  {:>10}  {:>12}", "---------", "---------");
    for (freq, magnitude) in spectrum.peaks(n) {
        println!("  {:>10.1}  {:>12.4e}", freq, magnitude);
    }
}

/// Write a spectrum as JSON when the path ends in `.json`, CSV otherwise.
pub fn write_spectrum(path: &Path, spectrum: &Spectrum) -> anyhow::Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let content = if is_json {
        spectrum.to_json()?
    } else {
        spectrum.to_csv()
    };
    std::fs::write(path, content)?;
    println!("Wrote spectrum to {}", path.display());
    Ok(())
}

/// Resolve a probe name to a path, falling back to the name itself.
pub fn probe_path(name: &str) -> PathBuf {
    find_probe(name).unwrap_or_else(|| PathBuf::from(name))
}

/// Load the segment records of a probe that must exist.
pub fn load_probe(name: &str) -> anyhow::Result<(PathBuf, Vec<SegmentParameters>)> {
    let Some(path) = find_probe(name) else {
        anyhow::bail!("Probe '{}' not found", name);
    };
    let segments = load_segments(&path)?;
    Ok((path, segments))
}

/// The single sample rate shared by all segments, or `fallback` for an empty probe.
pub fn probe_sample_rate(segments: &[SegmentParameters], fallback: u32) -> anyhow::Result<u32> {
    let Some(first) = segments.first() else {
        return Ok(fallback);
    };
    if let Some(other) = segments.iter().find(|s| s.sample_rate != first.sample_rate) {
        anyhow::bail!(
            "Probe mixes sample rates ({} Hz and {} Hz)",
            first.sample_rate,
            other.sample_rate
        );
    }
    Ok(first.sample_rate)
}
