use thiserror::Error;

/// Errors returned by `Rope` operations that take offsets or ranges.
///
/// `S` is the adapter's `SizeType`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RopeError<S> {
    #[error("offset {offset} is out of range for a rope of length {len}")]
    OffsetOutOfRange { offset: S, len: S },

    #[error("range {start}..={end} is out of bounds for a rope of length {len}")]
    RangeOutOfBounds { start: S, end: S, len: S },

    #[error("range start {start} is greater than range end {end}")]
    InvertedRange { start: S, end: S },
}

pub type Result<T, S> = std::result::Result<T, RopeError<S>>;
