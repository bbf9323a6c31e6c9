//! Steppe Analysis - spectrum views for stepped frequency measurements
//!
//! - [`fft`] - Forward FFT with plan caching
//! - [`spectrum`] - Source and response magnitude spectra, analysis windows, axes
//! - [`sweep`] - Calibration chirps (linear, logarithmic, hyperbolic)
//!
//! ## Example
//!
//! ```rust
//! use steppe_analysis::{AnalysisWindow, SpectrumAnalyzer};
//!
//! let capture = vec![0.0f32; 88200];
//! let mut analyzer = SpectrumAnalyzer::new(44100);
//!
//! // Skip the first 100 ms, keep everything after it.
//! let window = AnalysisWindow::from_signed(100, -1);
//! let response = analyzer.response(&capture, window);
//! assert_eq!(response.len(), (88200 - 4410) / 2);
//! ```

pub mod fft;
pub mod spectrum;
pub mod sweep;

pub use fft::Fft;
pub use spectrum::{AnalysisWindow, Spectrum, SpectrumAnalyzer, frequency_axis, time_axis};
pub use sweep::{Sweep, SweepMethod};
