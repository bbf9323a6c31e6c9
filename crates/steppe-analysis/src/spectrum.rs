//! Magnitude spectra of the outgoing probe and the captured response.
//!
//! Two views are computed:
//!
//! - **Source view** ([`SpectrumAnalyzer::source`]): the raw probe, no analysis
//!   window, unnormalized magnitudes.
//! - **Response view** ([`SpectrumAnalyzer::response`]): a slice of the capture
//!   selected by an [`AnalysisWindow`], Hann windowed, magnitudes divided by the
//!   number of retained bins.
//!
//! Both keep the first half of the DFT bins and pair them with a frequency axis of
//! evenly spaced points from 0 to `fs / 2` (integer division).

use crate::fft::Fft;
use serde::Serialize;
use std::fmt::Write;
use std::ops::Range;
use steppe_core::{WindowShape, linspace, ms_to_frames};

/// Time range of a capture to analyze, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisWindow {
    /// Start of the range.
    pub start_ms: u32,
    /// End of the range, or `None` for the end of the buffer.
    pub stop_ms: Option<u32>,
}

impl AnalysisWindow {
    /// The whole buffer.
    pub const FULL: AnalysisWindow = AnalysisWindow {
        start_ms: 0,
        stop_ms: None,
    };

    /// Create a window from signed millisecond values.
    ///
    /// A negative start clamps to 0; a negative stop (conventionally -1) means
    /// "end of buffer".
    pub fn from_signed(start_ms: i64, stop_ms: i64) -> Self {
        Self {
            start_ms: start_ms.clamp(0, i64::from(u32::MAX)) as u32,
            stop_ms: (stop_ms >= 0).then(|| stop_ms.min(i64::from(u32::MAX)) as u32),
        }
    }

    /// Stop value in the signed convention (-1 for "end of buffer").
    pub fn stop_signed(&self) -> i64 {
        self.stop_ms.map_or(-1, i64::from)
    }

    /// Frame range selected in a buffer of `len` frames at `sample_rate`.
    ///
    /// The range is clamped to the buffer and is empty when stop precedes start.
    pub fn frame_range(&self, len: usize, sample_rate: u32) -> Range<usize> {
        let start = ms_to_frames(self.start_ms, sample_rate).min(len);
        let stop = self
            .stop_ms
            .map_or(len, |ms| ms_to_frames(ms, sample_rate).min(len));
        start..stop.max(start)
    }

    /// The selected part of `samples`.
    pub fn slice<'a>(&self, samples: &'a [f32], sample_rate: u32) -> &'a [f32] {
        &samples[self.frame_range(samples.len(), sample_rate)]
    }
}

/// Magnitude spectrum with its frequency axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Spectrum {
    /// Bin frequencies in Hz, from 0 to `fs / 2`.
    pub frequencies: Vec<f32>,
    /// Bin magnitudes.
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// Check if the spectrum has no bins.
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// The bin with the largest magnitude, as `(frequency, magnitude)`.
    pub fn peak(&self) -> Option<(f32, f32)> {
        self.peaks(1).into_iter().next()
    }

    /// The `n` bins with the largest magnitudes, strongest first.
    pub fn peaks(&self, n: usize) -> Vec<(f32, f32)> {
        let mut bins: Vec<(f32, f32)> = self
            .frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
            .collect();
        bins.sort_by(|a, b| b.1.total_cmp(&a.1));
        bins.truncate(n);
        bins
    }

    /// Render as `frequency_hz,magnitude` CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("frequency_hz,magnitude\n");
        for (f, m) in self.frequencies.iter().zip(self.magnitudes.iter()) {
            let _ = writeln!(csv, "{:.3},{:.6e}", f, m);
        }
        csv
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Evenly spaced frequency axis of `bins` points over `[0, sample_rate / 2]`.
pub fn frequency_axis(bins: usize, sample_rate: u32) -> Vec<f32> {
    linspace(0.0, f64::from(sample_rate / 2), bins)
        .into_iter()
        .map(|f| f as f32)
        .collect()
}

/// Evenly spaced time axis of `len` points over `[0, len / sample_rate]` seconds.
pub fn time_axis(len: usize, sample_rate: u32) -> Vec<f32> {
    linspace(0.0, len as f64 / f64::from(sample_rate), len)
        .into_iter()
        .map(|t| t as f32)
        .collect()
}

/// Computes source and response spectra at a fixed sample rate.
pub struct SpectrumAnalyzer {
    sample_rate: u32,
    fft: Fft,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for signals at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fft: Fft::new(0),
        }
    }

    /// Sample rate the frequency axes are built for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spectrum of the raw signal: no analysis window, no normalization.
    pub fn source(&mut self, samples: &[f32]) -> Spectrum {
        if samples.is_empty() {
            return Spectrum::default();
        }
        self.fft.resize(samples.len());
        let magnitudes = self.fft.half_magnitudes(samples);
        Spectrum {
            frequencies: frequency_axis(magnitudes.len(), self.sample_rate),
            magnitudes,
        }
    }

    /// Spectrum of the part of a capture selected by `window`, Hann windowed and
    /// normalized by the number of retained bins.
    pub fn response(&mut self, samples: &[f32], window: AnalysisWindow) -> Spectrum {
        let slice = window.slice(samples, self.sample_rate);
        let hann = WindowShape::Hann.coefficients(slice.len());
        self.windowed(slice, &hann)
    }

    /// Spectrum of `samples` multiplied by `coefficients`, normalized by the number
    /// of retained bins.
    ///
    /// # Panics
    ///
    /// Panics if `coefficients` and `samples` differ in length.
    pub fn windowed(&mut self, samples: &[f32], coefficients: &[f64]) -> Spectrum {
        assert_eq!(
            samples.len(),
            coefficients.len(),
            "analysis window length must match the sample count"
        );
        if samples.is_empty() {
            return Spectrum::default();
        }

        let weighted: Vec<f32> = samples
            .iter()
            .zip(coefficients)
            .map(|(&s, &w)| (f64::from(s) * w) as f32)
            .collect();

        self.fft.resize(weighted.len());
        let mut magnitudes = self.fft.half_magnitudes(&weighted);
        let bins = magnitudes.len() as f32;
        for m in &mut magnitudes {
            *m /= bins;
        }

        tracing::debug!(
            frames = samples.len(),
            bins = magnitudes.len(),
            "response spectrum computed"
        );

        Spectrum {
            frequencies: frequency_axis(magnitudes.len(), self.sample_rate),
            magnitudes,
        }
    }
}
