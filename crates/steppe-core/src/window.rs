//! Symmetric window shapes.
//!
//! Windows are generated in their symmetric form (first and last coefficients mirror
//! each other), which is what segment tapers need. Coefficients are computed in `f64`
//! so that a taper followed by a tone multiplication stays reproducible.

use crate::frames::linspace;
use crate::{Error, Result};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Taper fraction of the Tukey window.
pub const TUKEY_ALPHA: f64 = 0.5;

/// Window shape tag, as selected for a segment and stored in segment files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowKind {
    /// Blackman-Harris window (4-term, -92 dB sidelobes)
    BlackmanHarris,
    /// Triangular window with zero end points (Bartlett)
    Triangular,
    /// Rectangular window (no taper)
    Rectangular,
    /// Sine-shaped window
    #[default]
    Cosine,
    /// Hann window (raised cosine)
    Hann,
    /// Gaussian window, width given by the segment's sigma
    Gaussian,
    /// Tukey window (tapered cosine) with [`TUKEY_ALPHA`]
    Tukey,
}

impl WindowKind {
    /// All window kinds, in the order they are offered for selection.
    pub const ALL: [WindowKind; 7] = [
        WindowKind::BlackmanHarris,
        WindowKind::Triangular,
        WindowKind::Rectangular,
        WindowKind::Cosine,
        WindowKind::Hann,
        WindowKind::Gaussian,
        WindowKind::Tukey,
    ];

    /// Name used when the window is written to a segment file.
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::BlackmanHarris => "blackmanharris",
            WindowKind::Triangular => "bartlett",
            WindowKind::Rectangular => "boxcar",
            WindowKind::Cosine => "cosine",
            WindowKind::Hann => "hann",
            WindowKind::Gaussian => "gaussian",
            WindowKind::Tukey => "tukey",
        }
    }

    /// Resolve the tag into a generator, attaching `sigma` for the Gaussian shape.
    pub fn shape(self, sigma: f64) -> WindowShape {
        match self {
            WindowKind::BlackmanHarris => WindowShape::BlackmanHarris,
            WindowKind::Triangular => WindowShape::Triangular,
            WindowKind::Rectangular => WindowShape::Rectangular,
            WindowKind::Cosine => WindowShape::Cosine,
            WindowKind::Hann => WindowShape::Hann,
            WindowKind::Gaussian => WindowShape::Gaussian(sigma),
            WindowKind::Tukey => WindowShape::Tukey,
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "blackmanharris" | "blackman-harris" => Ok(WindowKind::BlackmanHarris),
            "bartlett" | "triangular" | "triang" => Ok(WindowKind::Triangular),
            "boxcar" | "rectangular" | "rect" => Ok(WindowKind::Rectangular),
            "cosine" => Ok(WindowKind::Cosine),
            "hann" => Ok(WindowKind::Hann),
            "gaussian" | "gauss" => Ok(WindowKind::Gaussian),
            "tukey" => Ok(WindowKind::Tukey),
            _ => Err(Error::UnknownWindow(s.to_string())),
        }
    }
}

/// Window generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowShape {
    /// Rectangular (all ones)
    Rectangular,
    /// Triangular with zero end points
    Triangular,
    /// `sin(π (n + 0.5) / M)`
    Cosine,
    /// Hann window (raised cosine)
    Hann,
    /// Gaussian with the given standard deviation in samples
    Gaussian(f64),
    /// Blackman-Harris window
    BlackmanHarris,
    /// Tukey window with [`TUKEY_ALPHA`]
    Tukey,
}

impl WindowShape {
    /// Window coefficients for a window of `len` points.
    ///
    /// A zero-length window is empty and a single-point window is `[1.0]`.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        match len {
            0 => return Vec::new(),
            1 => return vec![1.0],
            _ => {}
        }

        let m = len as f64;
        match *self {
            WindowShape::Rectangular => vec![1.0; len],
            WindowShape::Triangular => {
                let half = (m - 1.0) / 2.0;
                (0..len)
                    .map(|n| {
                        let n = n as f64;
                        if n <= half {
                            2.0 * n / (m - 1.0)
                        } else {
                            2.0 - 2.0 * n / (m - 1.0)
                        }
                    })
                    .collect()
            }
            WindowShape::Cosine => (0..len)
                .map(|n| (PI / m * (n as f64 + 0.5)).sin())
                .collect(),
            WindowShape::Hann => general_cosine(len, &[0.5, 0.5]),
            WindowShape::BlackmanHarris => {
                general_cosine(len, &[0.35875, 0.48829, 0.14128, 0.01168])
            }
            WindowShape::Gaussian(sigma) => {
                let center = (m - 1.0) / 2.0;
                let two_sigma_sq = 2.0 * sigma * sigma;
                (0..len)
                    .map(|n| {
                        let x = n as f64 - center;
                        (-(x * x) / two_sigma_sq).exp()
                    })
                    .collect()
            }
            WindowShape::Tukey => tukey(len, TUKEY_ALPHA),
        }
    }

    /// Multiply `buffer` by a window of matching length.
    pub fn apply(&self, buffer: &mut [f32]) {
        let coeffs = self.coefficients(buffer.len());
        for (sample, w) in buffer.iter_mut().zip(coeffs) {
            *sample = (f64::from(*sample) * w) as f32;
        }
    }
}

/// Sum of cosines over `[-π, π]`: `Σ a_k cos(k x)`.
fn general_cosine(len: usize, coeffs: &[f64]) -> Vec<f64> {
    linspace(-PI, PI, len)
        .into_iter()
        .map(|x| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, a)| a * (k as f64 * x).cos())
                .sum()
        })
        .collect()
}

fn tukey(len: usize, alpha: f64) -> Vec<f64> {
    if alpha <= 0.0 {
        return vec![1.0; len];
    }
    if alpha >= 1.0 {
        return general_cosine(len, &[0.5, 0.5]);
    }

    let m = len as f64;
    let width = (alpha * (m - 1.0) / 2.0).floor() as usize;
    (0..len)
        .map(|i| {
            let n = i as f64;
            if i <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * n / alpha / (m - 1.0))).cos())
            } else if i < len - width - 1 {
                1.0
            } else {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * n / alpha / (m - 1.0))).cos())
            }
        })
        .collect()
}
