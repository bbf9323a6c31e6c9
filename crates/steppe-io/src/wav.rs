//! WAV export of recordings and rendered probes.

use crate::coordinator::Recording;
use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample; 32 writes IEEE float, anything else integer PCM.
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// Mono 32-bit float at `sample_rate`.
    pub fn mono_float(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
        }
    }
}

impl Default for WavSpec {
    fn default() -> Self {
        Self::mono_float(44100)
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Write mono samples to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path.as_ref(), hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).round().clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    tracing::debug!(
        path = %path.as_ref().display(),
        frames = samples.len(),
        sample_rate = spec.sample_rate,
        "wav written"
    );
    Ok(())
}

/// Write a recording as mono 32-bit float at its own sample rate.
pub fn write_recording<P: AsRef<Path>>(path: P, recording: &Recording) -> Result<()> {
    write_wav(path, &recording.samples, WavSpec::mono_float(recording.sample_rate))
}

/// Read a WAV file as mono f32 samples along with its spec.
///
/// Multi-channel files are mixed down by averaging channels.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::SessionId;
    use tempfile::NamedTempFile;

    #[test]
    fn test_recording_roundtrip() {
        let recording = Recording {
            session: SessionId::default(),
            samples: vec![0.0, 0.25, -0.5, 1.0],
            sample_rate: 22050,
            captured_bytes: 8,
            device_errors: Vec::new(),
        };

        let file = NamedTempFile::new().unwrap();
        write_recording(file.path(), &recording).unwrap();

        let (samples, spec) = read_wav(file.path()).unwrap();
        assert_eq!(spec, WavSpec::mono_float(22050));
        assert_eq!(samples, recording.samples);
    }

    #[test]
    fn test_int16_write() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
        };
        write_wav(file.path(), &[0.5, -2.0], spec).unwrap();

        let (samples, read_spec) = read_wav(file.path()).unwrap();
        assert_eq!(read_spec.bits_per_sample, 16);
        assert!((samples[0] - 0.5).abs() < 1e-4);
        assert_eq!(samples[1], -1.0);
    }
}
