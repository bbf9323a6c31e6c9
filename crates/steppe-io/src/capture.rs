//! Raw PCM accumulation for one capture session.

use steppe_core::codec::{self, BYTES_PER_SAMPLE};

/// Accumulates little-endian `i16` bytes delivered by the input device.
///
/// Chunk sizes are whatever the device hands over; a chunk may even split a
/// sample across two deliveries. Only [`finalize`](Self::finalize) interprets the
/// bytes, dropping a trailing odd byte.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Vec<u8>,
}

impl CaptureBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk in delivery order.
    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Discard everything captured so far.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Decode the accumulated bytes into samples.
    pub fn finalize(&self) -> Vec<f32> {
        codec::decode(&self.bytes[..self.even_len()])
    }

    /// Bytes captured so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte count rounded down to whole samples.
    pub fn even_len(&self) -> usize {
        self.bytes.len() - self.bytes.len() % BYTES_PER_SAMPLE
    }

    /// Whole samples captured so far.
    pub fn frames(&self) -> usize {
        self.bytes.len() / BYTES_PER_SAMPLE
    }

    /// The raw captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
