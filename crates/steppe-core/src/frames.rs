//! Millisecond to frame conversion and evenly spaced grids.

/// Convert a length in milliseconds to a frame count at `sample_rate`.
///
/// Uses floor division on the `ms * sample_rate` product, in 64-bit so that
/// long sweeps at 192 kHz cannot overflow.
#[inline]
pub fn ms_to_frames(ms: u32, sample_rate: u32) -> usize {
    (u64::from(ms) * u64::from(sample_rate) / 1000) as usize
}

/// Return `num` evenly spaced points over the closed interval `[start, stop]`.
///
/// The last point is exactly `stop` when `num > 1`; a single point is `start`.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut points: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            points[num - 1] = stop;
            points
        }
    }
}
