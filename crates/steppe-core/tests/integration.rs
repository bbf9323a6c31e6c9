//! Integration tests for steppe-core.
//!
//! Exercises the synthesis path the way a measurement uses it: build segments,
//! assemble a probe, encode it for playback and stream it out in device-sized reads.

use steppe_core::codec::{self, PcmSource};
use steppe_core::{Error, Probe, Segment, SegmentParameters, WindowKind};

// ---------------------------------------------------------------------------
// Reference segment
// ---------------------------------------------------------------------------

/// 850 Hz cosine-tapered burst, 200 + 600 + 200 ms at 44.1 kHz.
fn reference_params() -> SegmentParameters {
    SegmentParameters {
        sample_rate: 44100,
        frequency: 850,
        sigma: 2.5,
        duration_ms: 600,
        start_offset_ms: 0,
        stop_offset_ms: 0,
        window: WindowKind::Cosine,
        window_open_ms: 200,
        window_close_ms: 200,
    }
}

#[test]
fn reference_segment_has_one_second_of_frames() {
    let segment = Segment::new(reference_params()).unwrap();
    assert_eq!(segment.len(), 44100);

    let samples = segment.samples();
    assert!(samples[0].abs() < 1e-6, "first frame {}", samples[0]);
    assert!(
        samples[44099].abs() < 1e-3,
        "last frame {}",
        samples[44099]
    );

    let interior_rms = (samples[10000..30000].iter().map(|s| s * s).sum::<f32>() / 20000.0).sqrt();
    assert!(
        (interior_rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01,
        "interior rms {}",
        interior_rms
    );
}

#[test]
fn reference_tapers_rise_and_fall() {
    let samples = Segment::new(reference_params()).unwrap().into_samples();

    let peak = |range: std::ops::Range<usize>| {
        samples[range]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    };

    // Opening taper grows towards the flat region, closing taper decays after it.
    assert!(peak(0..500) < peak(4000..4500));
    assert!(peak(4000..4500) < peak(8300..8800));
    assert!(peak(43600..44100) < peak(39600..40100));
}

#[test]
fn every_window_shape_synthesizes() {
    for window in WindowKind::ALL {
        let params = SegmentParameters {
            window,
            ..reference_params()
        };
        let segment = Segment::new(params).unwrap();
        assert_eq!(segment.len(), 44100, "{window}");
        assert!(segment.samples().iter().all(|s| s.is_finite()), "{window}");
    }
}

// ---------------------------------------------------------------------------
// Probe → PCM stream
// ---------------------------------------------------------------------------

#[test]
fn probe_streams_as_pcm_in_device_sized_reads() {
    let mut probe = Probe::new();
    for frequency in [500, 1000, 2000] {
        probe.push(
            Segment::new(SegmentParameters {
                frequency,
                duration_ms: 50,
                window_open_ms: 10,
                window_close_ms: 10,
                start_offset_ms: 5,
                ..reference_params()
            })
            .unwrap(),
        );
    }

    let mut source = PcmSource::new(probe.composite());
    assert_eq!(source.len(), probe.total_frames() * 2);

    let mut streamed = Vec::new();
    loop {
        let chunk = source.read(1023);
        if chunk.is_empty() {
            break;
        }
        streamed.extend_from_slice(chunk);
    }
    assert_eq!(streamed, codec::encode(probe.composite()));

    let decoded = codec::decode(&streamed);
    for (a, b) in decoded.iter().zip(probe.composite()) {
        assert!((a - b).abs() <= 1.0 / 32767.0);
    }
}

#[test]
fn invalid_segment_does_not_disturb_probe() {
    let mut probe = Probe::new();
    probe.push(Segment::new(reference_params()).unwrap());

    let bad = SegmentParameters {
        frequency: 0,
        ..reference_params()
    };
    let err = Segment::new(bad).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
    assert_eq!(probe.len(), 1);
    assert_eq!(probe.total_frames(), 44100);
}
