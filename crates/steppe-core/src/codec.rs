//! Conversion between normalized float samples and 16-bit PCM.
//!
//! The device contract is mono, signed 16-bit, little-endian. Floats map to integers
//! with a scale of `i16::MAX` (so ±1.0 maps to ±32767) and saturate outside the
//! range instead of wrapping.

use std::io;

/// Scale between a normalized float and an `i16` sample.
pub const PCM_SCALE: f32 = i16::MAX as f32;

/// Bytes per mono 16-bit frame.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one float to a saturated `i16`.
#[inline]
pub fn encode_sample(x: f32) -> i16 {
    (x * PCM_SCALE)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Convert one `i16` back to a float.
#[inline]
pub fn decode_sample(v: i16) -> f32 {
    f32::from(v) / PCM_SCALE
}

/// Encode floats as little-endian `i16` bytes, two per sample.
pub fn encode(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for &x in samples {
        bytes.extend_from_slice(&encode_sample(x).to_le_bytes());
    }
    bytes
}

/// Decode little-endian `i16` bytes to floats.
///
/// A trailing odd byte is ignored.
pub fn decode(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| decode_sample(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Pull-based PCM source for feeding an output device.
///
/// Samples are encoded once up front; reads hand out bytes from a cursor that only
/// moves forward until [`reset`](Self::reset) or [`set_cursor`](Self::set_cursor).
#[derive(Debug, Clone, Default)]
pub struct PcmSource {
    buffer: Vec<u8>,
    cursor: usize,
}

impl PcmSource {
    /// Encode `samples` into a new source positioned at the start.
    pub fn new(samples: &[f32]) -> Self {
        Self::from_bytes(encode(samples))
    }

    /// Wrap already-encoded PCM bytes.
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Return up to `max_bytes` bytes from the cursor and advance past them.
    ///
    /// Returns an empty slice once the end is reached.
    pub fn read(&mut self, max_bytes: usize) -> &[u8] {
        let start = self.cursor;
        self.cursor = self.buffer.len().min(start.saturating_add(max_bytes));
        &self.buffer[start..self.cursor]
    }

    /// Fill `out` with whole samples from the cursor, zeroing whatever is left.
    ///
    /// A cursor left between the two bytes of a sample first moves on to the next
    /// sample boundary. Returns the number of samples taken from the source.
    pub fn fill(&mut self, out: &mut [i16]) -> usize {
        if self.cursor % BYTES_PER_SAMPLE != 0 {
            self.cursor = self.buffer.len().min(self.cursor + 1);
        }
        let bytes = self.read(out.len() * BYTES_PER_SAMPLE);
        let mut written = 0;
        for (dst, pair) in out.iter_mut().zip(bytes.chunks_exact(BYTES_PER_SAMPLE)) {
            *dst = i16::from_le_bytes([pair[0], pair[1]]);
            written += 1;
        }
        out[written..].fill(0);
        written
    }

    /// Rewind to the start.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor, clamped to `[0, len - 1]` (or 0 for an empty buffer).
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.buffer.len().saturating_sub(1));
    }

    /// Current cursor position in bytes.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total encoded size in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the source holds no data.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Check if every byte has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    /// The full encoded buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

impl io::Read for PcmSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = PcmSource::read(self, buf.len());
        let n = chunk.len();
        buf[..n].copy_from_slice(chunk);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode(&[0.0, 1.0, -1.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0xFF, 0x7F, 0x01, 0x80]);
    }

    #[test]
    fn test_encode_rounds() {
        assert_eq!(encode_sample(0.5), 16384);
        assert_eq!(encode_sample(-0.5), -16384);
        assert_eq!(encode_sample(1.0 / 32767.0 * 0.49), 0);
    }

    #[test]
    fn test_encode_saturates() {
        assert_eq!(encode_sample(2.0), i16::MAX);
        assert_eq!(encode_sample(-2.0), i16::MIN);
        assert_eq!(encode_sample(f32::INFINITY), i16::MAX);
        assert_eq!(encode_sample(f32::NEG_INFINITY), i16::MIN);
    }

    #[test]
    fn test_decode_drops_trailing_byte() {
        let decoded = decode(&[0xFF, 0x7F, 0x00]);
        assert_eq!(decoded, vec![1.0]);
    }

    #[test]
    fn test_read_advances_and_ends() {
        let mut source = PcmSource::new(&[0.1, 0.2, 0.3]);
        assert_eq!(source.len(), 6);
        assert_eq!(source.read(4).len(), 4);
        assert_eq!(source.position(), 4);
        assert_eq!(source.read(100).len(), 2);
        assert!(source.is_exhausted());
        assert!(source.read(100).is_empty());

        source.reset();
        assert_eq!(source.remaining(), 6);
    }

    #[test]
    fn test_set_cursor_clamps() {
        let mut source = PcmSource::new(&[0.1, 0.2]);
        source.set_cursor(100);
        assert_eq!(source.position(), 3);

        let mut empty = PcmSource::new(&[]);
        empty.set_cursor(5);
        assert_eq!(empty.position(), 0);
        assert!(empty.read(10).is_empty());
    }

    #[test]
    fn test_fill_pads_with_silence() {
        let mut source = PcmSource::new(&[1.0, -1.0, 0.5]);
        let mut out = [7i16; 2];
        assert_eq!(source.fill(&mut out), 2);
        assert_eq!(out, [32767, -32767]);

        let mut out = [7i16; 4];
        assert_eq!(source.fill(&mut out), 1);
        assert_eq!(out, [16384, 0, 0, 0]);

        assert_eq!(source.fill(&mut out), 0);
        assert_eq!(out, [0; 4]);
    }

    #[test]
    fn test_fill_realigns_odd_cursor() {
        let mut source = PcmSource::new(&[0.5; 3]);
        source.set_cursor(1);
        let mut out = [7i16; 3];
        assert_eq!(source.fill(&mut out), 2);
        assert_eq!(out, [16384, 16384, 0]);
        assert!(source.is_exhausted());

        // Odd cursor on the last byte: nothing whole is left.
        source.set_cursor(5);
        assert_eq!(source.fill(&mut out), 0);
        assert_eq!(out, [0; 3]);
    }

    #[test]
    fn test_io_read() {
        use std::io::Read;

        let mut source = PcmSource::new(&[0.25; 8]);
        let mut all = Vec::new();
        source.read_to_end(&mut all).unwrap();
        assert_eq!(all, encode(&[0.25; 8]));
    }
}
