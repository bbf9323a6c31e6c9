//! Steppe Core - probe synthesis for stepped frequency measurements
//!
//! This crate builds the signal that a measurement plays into a room or a device
//! under test, and converts it to and from the 16-bit PCM the audio devices speak:
//!
//! - [`window`] - Symmetric window shapes used for segment tapers and analysis
//! - [`segment`] - Windowed tone bursts with leading/trailing silence
//! - [`probe`] - Ordered list of segments concatenated into one composite signal
//! - [`codec`] - Float ↔ little-endian `i16` conversion and a pull-based PCM source
//! - [`frames`] - Millisecond to frame arithmetic shared by every stage
//!
//! ## Frame Arithmetic
//!
//! All lengths are given in milliseconds and converted with integer floor division,
//! `ms * fs / 1000`. Two segments with the same parameters therefore always produce
//! bit-identical sample buffers.
//!
//! ## Example
//!
//! ```rust
//! use steppe_core::{Probe, Segment, SegmentParameters, WindowKind};
//!
//! let mut probe = Probe::new();
//! for hertz in [500, 1000, 2000] {
//!     let params = SegmentParameters {
//!         frequency: hertz,
//!         window: WindowKind::Hann,
//!         ..SegmentParameters::default()
//!     };
//!     probe.push(Segment::new(params)?);
//! }
//!
//! let pcm = steppe_core::codec::encode(probe.composite());
//! assert_eq!(pcm.len(), probe.total_frames() * 2);
//! # Ok::<(), steppe_core::Error>(())
//! ```

pub mod codec;
pub mod frames;
pub mod probe;
pub mod segment;
pub mod window;

pub use codec::{PcmSource, decode, encode};
pub use frames::{linspace, ms_to_frames};
pub use probe::Probe;
pub use segment::{Segment, SegmentParameters, synthesize};
pub use window::{WindowKind, WindowShape};

/// Errors raised while configuring segments or editing a probe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A segment parameter is outside the range synthesis can work with.
    #[error("invalid configuration: {field} = {value}")]
    InvalidConfiguration {
        /// Name of the offending parameter.
        field: &'static str,
        /// The rejected value, rendered for display.
        value: String,
    },

    /// A segment index does not address an existing segment.
    #[error("segment index {index} out of range (probe holds {len} segments)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of segments at the time of the request.
        len: usize,
    },

    /// A window name could not be matched to a known shape.
    #[error("unknown window function: {0}")]
    UnknownWindow(String),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, value: impl ToString) -> Self {
        Error::InvalidConfiguration {
            field,
            value: value.to_string(),
        }
    }
}

/// Convenience result type for synthesis and probe operations.
pub type Result<T> = std::result::Result<T, Error>;
