//! Calibration sweeps.
//!
//! A sweep is a cosine chirp whose instantaneous frequency moves from `start_hz`
//! to `stop_hz` over `duration_ms`. It can be played through the measurement path
//! in place of a probe to check the loopback before a stepped measurement.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use steppe_core::{Error, Result, linspace, ms_to_frames};

/// Frequency law of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepMethod {
    /// Frequency changes at a constant rate.
    #[default]
    Linear,
    /// Frequency changes by a constant ratio per unit time.
    Logarithmic,
    /// Period changes at a constant rate.
    Hyperbolic,
}

impl SweepMethod {
    /// All methods, in display order.
    pub const ALL: [SweepMethod; 3] = [
        SweepMethod::Linear,
        SweepMethod::Logarithmic,
        SweepMethod::Hyperbolic,
    ];

    /// Lowercase name used in settings files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            SweepMethod::Linear => "linear",
            SweepMethod::Logarithmic => "logarithmic",
            SweepMethod::Hyperbolic => "hyperbolic",
        }
    }
}

impl fmt::Display for SweepMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "lin" => Ok(SweepMethod::Linear),
            "logarithmic" | "log" | "exponential" => Ok(SweepMethod::Logarithmic),
            "hyperbolic" | "hyp" => Ok(SweepMethod::Hyperbolic),
            _ => Err(Error::InvalidConfiguration {
                field: "sweep_method",
                value: s.to_string(),
            }),
        }
    }
}

/// A calibration sweep description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Frequency law.
    pub method: SweepMethod,
    /// Length of the sweep.
    pub duration_ms: u32,
    /// Instantaneous frequency at `t = 0`.
    pub start_hz: f64,
    /// Instantaneous frequency at the last sample.
    pub stop_hz: f64,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            method: SweepMethod::Linear,
            duration_ms: 5000,
            start_hz: 220.0,
            stop_hz: 3520.0,
        }
    }
}

impl Sweep {
    /// Number of frames the sweep occupies at `sample_rate`.
    pub fn frames(&self, sample_rate: u32) -> usize {
        ms_to_frames(self.duration_ms, sample_rate)
    }

    fn validate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfiguration {
                field: "sample_rate",
                value: sample_rate.to_string(),
            });
        }
        for (field, hz) in [("start_hz", self.start_hz), ("stop_hz", self.stop_hz)] {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(Error::InvalidConfiguration {
                    field,
                    value: hz.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Instantaneous phase in radians at time `t` seconds, for a sweep of `t1` seconds.
    fn phase(&self, t: f64, t1: f64) -> f64 {
        let (f0, f1) = (self.start_hz, self.stop_hz);
        if f0 == f1 || t1 <= 0.0 {
            return TAU * f0 * t;
        }
        match self.method {
            SweepMethod::Linear => TAU * (f0 * t + 0.5 * (f1 - f0) / t1 * t * t),
            SweepMethod::Logarithmic => {
                let beta = t1 / (f1 / f0).ln();
                TAU * beta * f0 * ((f1 / f0).powf(t / t1) - 1.0)
            }
            SweepMethod::Hyperbolic => {
                let singular = -f1 * t1 / (f0 - f1);
                TAU * (-singular * f0) * (1.0 - t / singular).abs().ln()
            }
        }
    }

    /// Render the sweep at `sample_rate` as unit-amplitude samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a zero sample rate or a
    /// non-positive frequency.
    pub fn generate(&self, sample_rate: u32) -> Result<Vec<f32>> {
        self.validate(sample_rate)?;

        let t1 = f64::from(self.duration_ms) / 1000.0;
        let samples: Vec<f32> = linspace(0.0, t1, self.frames(sample_rate))
            .into_iter()
            .map(|t| self.phase(t, t1).cos() as f32)
            .collect();

        tracing::debug!(
            method = %self.method,
            frames = samples.len(),
            start_hz = self.start_hz,
            stop_hz = self.stop_hz,
            "sweep generated"
        );
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpectrumAnalyzer;

    fn sweep(method: SweepMethod) -> Sweep {
        Sweep {
            method,
            duration_ms: 1000,
            start_hz: 200.0,
            stop_hz: 2000.0,
        }
    }

    #[test]
    fn test_length_and_first_sample() {
        for method in SweepMethod::ALL {
            let samples = sweep(method).generate(8000).unwrap();
            assert_eq!(samples.len(), 8000, "{method}");
            assert!((samples[0] - 1.0).abs() < 1e-6, "{method}");
            assert!(samples.iter().all(|s| s.abs() <= 1.0 + 1e-6), "{method}");
        }
    }

    #[test]
    fn test_equal_frequencies_give_constant_tone() {
        let tone = Sweep {
            method: SweepMethod::Logarithmic,
            duration_ms: 1000,
            start_hz: 1000.0,
            stop_hz: 1000.0,
        };
        let samples = tone.generate(8000).unwrap();
        let mut analyzer = SpectrumAnalyzer::new(8000);
        let (freq, _) = analyzer.source(&samples).peak().unwrap();
        assert!((freq - 1000.0).abs() < 2.0, "peak at {}", freq);
    }

    #[test]
    fn test_linear_instantaneous_frequency() {
        // Phase derivative at t1 is 2π f1.
        let s = sweep(SweepMethod::Linear);
        let dt = 1e-6;
        let rate = (s.phase(1.0, 1.0) - s.phase(1.0 - dt, 1.0)) / dt / TAU;
        assert!((rate - 2000.0).abs() < 0.1, "{}", rate);
    }

    #[test]
    fn test_log_and_hyperbolic_endpoints() {
        let dt = 1e-6;
        for method in [SweepMethod::Logarithmic, SweepMethod::Hyperbolic] {
            let s = sweep(method);
            let start = (s.phase(dt, 1.0) - s.phase(0.0, 1.0)) / dt / TAU;
            let end = (s.phase(1.0, 1.0) - s.phase(1.0 - dt, 1.0)) / dt / TAU;
            assert!((start - 200.0).abs() < 0.5, "{method} start {}", start);
            assert!((end - 2000.0).abs() < 0.5, "{method} end {}", end);
        }
    }

    #[test]
    fn test_zero_duration_is_empty() {
        let s = Sweep {
            duration_ms: 0,
            ..Sweep::default()
        };
        assert!(s.generate(44100).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Sweep::default().generate(0).is_err());
        let s = Sweep {
            start_hz: 0.0,
            ..Sweep::default()
        };
        assert!(matches!(
            s.generate(44100),
            Err(Error::InvalidConfiguration {
                field: "start_hz",
                ..
            })
        ));
    }

    #[test]
    fn test_method_names() {
        for method in SweepMethod::ALL {
            assert_eq!(method.name().parse::<SweepMethod>().unwrap(), method);
        }
        assert_eq!("LOG".parse::<SweepMethod>().unwrap(), SweepMethod::Logarithmic);
        assert!("quadratic".parse::<SweepMethod>().is_err());
    }
}
