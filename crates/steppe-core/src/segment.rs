//! Windowed tone bursts.
//!
//! A segment is a sine tone shaped by an envelope that resembles `_/'''\_`:
//!
//! ```text
//!  start offset   open taper    flat region     close taper   stop offset
//! ├────────────┼─────────────┼───────────────┼─────────────┼────────────┤
//!  silence        rising half   unity gain      falling half  silence
//! ```
//!
//! Each taper is the first (or last) half of a window generated over twice the taper
//! length, so the taper meets the flat region at the window's peak instead of
//! being a complete symmetric window.

use crate::frames::{linspace, ms_to_frames};
use crate::window::{WindowKind, WindowShape};
use crate::{Error, Result};
use std::f64::consts::PI;

/// Parameters of one tone burst.
///
/// All times are in milliseconds and all rates in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParameters {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Tone frequency in Hz.
    pub frequency: u32,
    /// Standard deviation (in samples) of the Gaussian taper. Ignored by other shapes.
    pub sigma: f64,
    /// Length of the flat, full-amplitude region.
    pub duration_ms: u32,
    /// Silence before the burst.
    pub start_offset_ms: u32,
    /// Silence after the burst.
    pub stop_offset_ms: u32,
    /// Shape of the opening and closing tapers.
    pub window: WindowKind,
    /// Length of the opening taper.
    pub window_open_ms: u32,
    /// Length of the closing taper.
    pub window_close_ms: u32,
}

impl Default for SegmentParameters {
    fn default() -> Self {
        Self {
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
}

impl SegmentParameters {
    /// Check that the parameters describe a synthesizable segment.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::invalid("sample_rate", self.sample_rate));
        }
        if self.frequency == 0 {
            return Err(Error::invalid("frequency", self.frequency));
        }
        if self.window == WindowKind::Gaussian && !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(Error::invalid("sigma", self.sigma));
        }
        let total = self
            .window_open_ms
            .checked_add(self.duration_ms)
            .and_then(|ms| ms.checked_add(self.window_close_ms))
            .and_then(|ms| ms.checked_add(self.window_open_ms.max(self.window_close_ms)));
        if total.is_none() {
            return Err(Error::invalid("duration_ms", self.duration_ms));
        }
        Ok(())
    }

    /// Window generator for the tapers.
    pub fn window_shape(&self) -> WindowShape {
        self.window.shape(self.sigma)
    }

    /// Taper, flat and taper lengths combined, in milliseconds.
    ///
    /// Saturates at `u32::MAX`; [`validate`](Self::validate) rejects such totals.
    pub fn envelope_ms(&self) -> u32 {
        self.window_open_ms
            .saturating_add(self.duration_ms)
            .saturating_add(self.window_close_ms)
    }

    /// Number of frames the tone is generated over.
    pub fn tone_frames(&self) -> usize {
        ms_to_frames(self.envelope_ms(), self.sample_rate)
    }

    /// Frames of leading silence.
    pub fn start_offset_frames(&self) -> usize {
        ms_to_frames(self.start_offset_ms, self.sample_rate)
    }

    /// Frames of trailing silence.
    pub fn stop_offset_frames(&self) -> usize {
        ms_to_frames(self.stop_offset_ms, self.sample_rate)
    }
}

/// Build the taper-flat-taper amplitude envelope.
///
/// Its length is the sum of three independently floored frame counts and may
/// differ by a frame from [`SegmentParameters::tone_frames`].
pub fn envelope(params: &SegmentParameters) -> Result<Vec<f64>> {
    params.validate()?;
    Ok(build_envelope(params))
}

/// Unshaped sine at the segment's frequency, spanning the full envelope time.
///
/// Sample instants are evenly spaced over the closed interval
/// `[0, envelope_ms / 1000]`.
pub fn tone(params: &SegmentParameters) -> Result<Vec<f64>> {
    params.validate()?;
    Ok(build_tone(params))
}

// Both builders assume validated parameters.
fn build_envelope(params: &SegmentParameters) -> Vec<f64> {
    let fs = params.sample_rate;
    let shape = params.window_shape();

    let open_full = shape.coefficients(ms_to_frames(2 * params.window_open_ms, fs));
    let open_len = ms_to_frames(params.window_open_ms, fs).min(open_full.len());

    let close_full = shape.coefficients(ms_to_frames(2 * params.window_close_ms, fs));
    let close_start = ms_to_frames(params.window_close_ms, fs).min(close_full.len());

    let flat = ms_to_frames(params.duration_ms, fs);

    let mut env = Vec::with_capacity(open_len + flat + close_full.len() - close_start);
    env.extend_from_slice(&open_full[..open_len]);
    env.resize(open_len + flat, 1.0);
    env.extend_from_slice(&close_full[close_start..]);
    env
}

fn build_tone(params: &SegmentParameters) -> Vec<f64> {
    let hertz = f64::from(params.frequency);
    let seconds = f64::from(params.envelope_ms()) / 1000.0;

    linspace(0.0, seconds, params.tone_frames())
        .into_iter()
        .map(|t| (2.0 * PI * hertz * t).sin())
        .collect()
}

/// Synthesize the sample buffer of one segment.
///
/// Output is silence, then `tone * envelope` truncated to the shorter of the two,
/// then silence.
pub fn synthesize(params: &SegmentParameters) -> Result<Vec<f32>> {
    params.validate()?;

    let env = build_envelope(params);
    let tone = build_tone(params);
    let lead = params.start_offset_frames();
    let tail = params.stop_offset_frames();
    let body = env.len().min(tone.len());

    let mut samples = Vec::with_capacity(lead + body + tail);
    samples.resize(lead, 0.0);
    samples.extend(tone.iter().zip(env.iter()).map(|(y, w)| (y * w) as f32));
    samples.resize(lead + body + tail, 0.0);

    tracing::debug!(
        frequency = params.frequency,
        sample_rate = params.sample_rate,
        envelope = env.len(),
        tone = tone.len(),
        frames = samples.len(),
        "segment synthesized"
    );

    Ok(samples)
}

/// A tone burst together with its synthesized samples.
///
/// The samples are derived from the parameters and recomputed in full whenever the
/// parameters change.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    params: SegmentParameters,
    samples: Vec<f32>,
}

impl Segment {
    /// Synthesize a new segment.
    pub fn new(params: SegmentParameters) -> Result<Self> {
        let samples = synthesize(&params)?;
        Ok(Self { params, samples })
    }

    /// Current parameters.
    pub fn params(&self) -> &SegmentParameters {
        &self.params
    }

    /// Synthesized samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames, including silence offsets.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the segment produced no samples at all.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Replace all parameters and recompute once.
    ///
    /// On error the segment keeps its previous parameters and samples.
    pub fn apply(&mut self, params: SegmentParameters) -> Result<()> {
        let samples = synthesize(&params)?;
        self.params = params;
        self.samples = samples;
        Ok(())
    }

    /// Edit several parameters at once, recomputing a single time afterwards.
    ///
    /// ```rust
    /// # use steppe_core::{Segment, SegmentParameters, WindowKind};
    /// let mut segment = Segment::new(SegmentParameters::default())?;
    /// segment.update(|p| {
    ///     p.frequency = 1000;
    ///     p.window = WindowKind::Hann;
    /// })?;
    /// assert_eq!(segment.params().frequency, 1000);
    /// # Ok::<(), steppe_core::Error>(())
    /// ```
    pub fn update<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut SegmentParameters),
    {
        let mut params = self.params;
        edit(&mut params);
        self.apply(params)
    }

    /// Consume the segment, returning its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}
