//! Integration tests for steppe-analysis.
//!
//! Builds probes with steppe-core and checks the spectra a measurement would show.

use steppe_analysis::{AnalysisWindow, SpectrumAnalyzer, Sweep, SweepMethod, time_axis};
use steppe_core::{Probe, SegmentParameters, WindowKind, codec};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stepped_probe(sample_rate: u32, freqs: &[u32]) -> Probe {
    let params: Vec<SegmentParameters> = freqs
        .iter()
        .map(|&frequency| SegmentParameters {
            sample_rate,
            frequency,
            duration_ms: 400,
            window_open_ms: 50,
            window_close_ms: 50,
            window: WindowKind::Hann,
            ..SegmentParameters::default()
        })
        .collect();
    Probe::from_parameters(&params).unwrap()
}

fn near(peaks: &[(f32, f32)], hz: f32, tolerance: f32) -> bool {
    peaks.iter().any(|(f, _)| (f - hz).abs() <= tolerance)
}

// ===========================================================================
// Source view
// ===========================================================================

#[test]
fn source_spectrum_shows_every_step() {
    let probe = stepped_probe(8000, &[500, 1000, 2000]);
    let mut analyzer = SpectrumAnalyzer::new(8000);
    let spectrum = analyzer.source(probe.composite());

    assert_eq!(spectrum.len(), probe.total_frames() / 2);
    assert_eq!(*spectrum.frequencies.last().unwrap(), 4000.0);

    // Strongest bins cluster around each step; take enough to cover the lobes.
    let peaks = spectrum.peaks(30);
    for hz in [500.0, 1000.0, 2000.0] {
        assert!(near(&peaks, hz, 5.0), "no peak near {hz} Hz");
    }
}

// ===========================================================================
// Response view
// ===========================================================================

#[test]
fn response_ignores_time_outside_window() {
    // First second holds 500 Hz, second holds 1500 Hz.
    let probe = stepped_probe(8000, &[500, 1500]);
    let recorded = codec::decode(&codec::encode(probe.composite()));
    let mut analyzer = SpectrumAnalyzer::new(8000);

    let first = analyzer.response(&recorded, AnalysisWindow::from_signed(0, 500));
    let (f, _) = first.peak().unwrap();
    assert!((f - 500.0).abs() < 10.0, "first half peak {f}");

    let second = analyzer.response(&recorded, AnalysisWindow::from_signed(500, -1));
    let (f, _) = second.peak().unwrap();
    assert!((f - 1500.0).abs() < 10.0, "second half peak {f}");
}

#[test]
fn response_of_silence_is_flat_zero() {
    let mut analyzer = SpectrumAnalyzer::new(44100);
    let silence = vec![0.0f32; 2 * 44100];

    let spectrum = analyzer.response(&silence, AnalysisWindow::from_signed(100, -1));
    assert_eq!(spectrum.len(), (88200 - 4410) / 2);
    assert!(spectrum.magnitudes.iter().all(|&m| m == 0.0));
}

// ===========================================================================
// Calibration sweep
// ===========================================================================

#[test]
fn linear_sweep_spreads_energy_over_its_band() {
    let sweep = Sweep {
        method: SweepMethod::Linear,
        duration_ms: 2000,
        start_hz: 500.0,
        stop_hz: 3000.0,
    };
    let samples = sweep.generate(8000).unwrap();
    assert_eq!(samples.len(), sweep.frames(8000));

    let mut analyzer = SpectrumAnalyzer::new(8000);
    let spectrum = analyzer.source(&samples);

    let band_energy: f32 = spectrum
        .frequencies
        .iter()
        .zip(&spectrum.magnitudes)
        .filter(|(f, _)| (600.0..2900.0).contains(*f))
        .map(|(_, m)| m * m)
        .sum();
    let total: f32 = spectrum.magnitudes.iter().map(|m| m * m).sum();
    assert!(band_energy / total > 0.8, "in-band ratio {}", band_energy / total);
}

#[test]
fn time_axis_matches_capture_length() {
    let axis = time_axis(44100, 44100);
    assert_eq!(axis.len(), 44100);
    assert_eq!(axis[0], 0.0);
    assert_eq!(axis[44099], 1.0);
}
