//! Composite probe signal assembled from segments.

use crate::segment::{Segment, SegmentParameters};
use crate::{Error, Result};
use std::cell::OnceCell;

/// Ordered list of segments played back-to-back as one signal.
///
/// The composite buffer is the concatenation of all segment buffers in list order.
/// It is built on first read and dropped by every mutation, so consecutive edits
/// cost one concatenation in total.
///
/// An empty probe is a valid, silent, zero-length signal.
#[derive(Debug, Default, Clone)]
pub struct Probe {
    segments: Vec<Segment>,
    composite: OnceCell<Vec<f32>>,
}

impl Probe {
    /// Create an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize a probe from a list of parameter sets.
    ///
    /// Fails on the first invalid parameter set.
    pub fn from_parameters<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a SegmentParameters>,
    {
        let mut probe = Self::new();
        probe.extend_from_parameters(params)?;
        Ok(probe)
    }

    /// Append one segment per parameter set.
    ///
    /// All segments are synthesized before any is added, so an invalid entry
    /// leaves the probe unchanged. Returns the number of segments added.
    pub fn extend_from_parameters<'a, I>(&mut self, params: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a SegmentParameters>,
    {
        let segments = params
            .into_iter()
            .map(|p| Segment::new(*p))
            .collect::<Result<Vec<_>>>()?;
        let added = segments.len();
        self.segments.extend(segments);
        self.invalidate();
        Ok(added)
    }

    /// Append a segment at the end.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.invalidate();
    }

    /// Insert a segment at `index`, shifting later segments back.
    ///
    /// An index at or past the end appends.
    pub fn insert(&mut self, index: usize, segment: Segment) {
        let index = index.min(self.segments.len());
        self.segments.insert(index, segment);
        self.invalidate();
    }

    /// Remove and return the segment at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Segment> {
        if index >= self.segments.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.segments.len(),
            });
        }
        let segment = self.segments.remove(index);
        self.invalidate();
        Ok(segment)
    }

    /// Remove all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.invalidate();
    }

    /// Replace the parameters of the segment at `index`, recomputing it once.
    ///
    /// On error the probe is unchanged.
    pub fn update(&mut self, index: usize, params: SegmentParameters) -> Result<()> {
        let len = self.segments.len();
        let segment = self
            .segments
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        segment.apply(params)?;
        self.invalidate();
        Ok(())
    }

    /// Segments in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameters of every segment in playback order.
    pub fn parameters(&self) -> Vec<SegmentParameters> {
        self.segments.iter().map(|s| *s.params()).collect()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the probe has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total length of the composite signal in frames.
    pub fn total_frames(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// The concatenated signal of all segments.
    pub fn composite(&self) -> &[f32] {
        self.composite.get_or_init(|| {
            let mut buffer = Vec::with_capacity(self.total_frames());
            for segment in &self.segments {
                buffer.extend_from_slice(segment.samples());
            }
            tracing::debug!(
                segments = self.segments.len(),
                frames = buffer.len(),
                "probe composite rebuilt"
            );
            buffer
        })
    }

    fn invalidate(&mut self) {
        self.composite.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(frequency: u32, duration_ms: u32) -> Segment {
        Segment::new(SegmentParameters {
            frequency,
            duration_ms,
            window_open_ms: 10,
            window_close_ms: 10,
            ..SegmentParameters::default()
        })
        .unwrap()
    }

    #[test]
    fn test_empty_probe_is_silent() {
        let probe = Probe::new();
        assert!(probe.composite().is_empty());
        assert_eq!(probe.total_frames(), 0);
    }

    #[test]
    fn test_composite_concatenates_in_order() {
        let a = segment(500, 20);
        let b = segment(1000, 30);
        let mut probe = Probe::new();
        probe.push(a.clone());
        probe.push(b.clone());

        let composite = probe.composite();
        assert_eq!(composite.len(), a.len() + b.len());
        assert_eq!(&composite[..a.len()], a.samples());
        assert_eq!(&composite[a.len()..], b.samples());
    }

    #[test]
    fn test_insert_positions() {
        let mut probe = Probe::new();
        probe.push(segment(500, 20));
        probe.push(segment(700, 20));
        probe.insert(1, segment(600, 20));
        probe.insert(99, segment(800, 20));

        let freqs: Vec<u32> = probe.segments().iter().map(|s| s.params().frequency).collect();
        assert_eq!(freqs, vec![500, 600, 700, 800]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut probe = Probe::new();
        probe.push(segment(500, 20));
        let before = probe.composite().to_vec();

        assert_eq!(
            probe.remove(3).unwrap_err(),
            Error::IndexOutOfRange { index: 3, len: 1 }
        );
        assert_eq!(probe.len(), 1);
        assert_eq!(probe.composite(), before.as_slice());
    }

    #[test]
    fn test_mutation_invalidates_composite() {
        let mut probe = Probe::new();
        probe.push(segment(500, 20));
        let first = probe.composite().len();

        probe.push(segment(600, 40));
        assert!(probe.composite().len() > first);

        probe.clear();
        assert!(probe.composite().is_empty());
    }

    #[test]
    fn test_update_segment() {
        let mut probe = Probe::new();
        probe.push(segment(500, 20));
        let params = SegmentParameters {
            frequency: 900,
            ..*probe.segments()[0].params()
        };
        probe.update(0, params).unwrap();
        assert_eq!(probe.segments()[0].params().frequency, 900);
        assert_eq!(probe.composite(), Segment::new(params).unwrap().samples());

        assert!(probe.update(4, params).is_err());
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut probe = Probe::new();
        probe.push(segment(500, 20));

        let good = SegmentParameters::default();
        let bad = SegmentParameters {
            sample_rate: 0,
            ..good
        };
        assert!(probe.extend_from_parameters(&[good, bad]).is_err());
        assert_eq!(probe.len(), 1);

        assert_eq!(probe.extend_from_parameters(&[good, good]).unwrap(), 2);
        assert_eq!(probe.len(), 3);
    }
}
