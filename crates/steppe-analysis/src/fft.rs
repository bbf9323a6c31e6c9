//! FFT wrapper with plan caching

use rustfft::{FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Forward FFT processor for real input of arbitrary length.
///
/// Keeps the planner around so that resizing to a length seen before reuses
/// the cached plan.
pub struct Fft {
    planner: FftPlanner<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        // Zero-length input never reaches the plan.
        let fft = planner.plan_fft_forward(size.max(1));

        Self { planner, fft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Resize the FFT (creates new plan if needed)
    pub fn resize(&mut self, size: usize) {
        if size != self.size {
            self.fft = self.planner.plan_fft_forward(size.max(1));
            self.size = size;
        }
    }

    /// Full complex spectrum of real input.
    ///
    /// Input shorter than the FFT size is zero padded, longer input is truncated.
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer: Vec<Complex<f32>> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        if self.size > 0 {
            self.fft.process(&mut buffer);
        }
        buffer
    }

    /// Magnitudes `|X[k]|` of the first `size / 2` bins (DC up to, not including, Nyquist
    /// for even sizes).
    pub fn half_magnitudes(&self, input: &[f32]) -> Vec<f32> {
        let mut spectrum = self.forward(input);
        spectrum.truncate(self.size / 2);
        spectrum.iter().map(|c| c.norm()).collect()
    }
}
