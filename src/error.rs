// THEORY:
// Every fallible entry point of the engine reports through a single error enum.
// Only malformed *inputs* are errors here: a buffer that cannot hold the image it
// claims to describe, a configuration string that names nothing, or a worker pool
// that went away. Logic errors inside the engine (a region index outside its
// length, an enumerator producing an out-of-range span) are not represented here;
// they panic at the point of access, because they mean the engine itself is wrong.

use thiserror::Error;

/// Errors surfaced by buffer construction, configuration and the parallel sorter.
#[derive(Debug, Error)]
pub enum SortError {
    /// The row stride cannot hold `width` RGBA pixels.
    #[error("row stride {stride} is smaller than width {width} x 4 bytes")]
    StrideTooSmall { stride: usize, width: u32 },

    /// The backing buffer is shorter than the last byte addressed by the image bounds.
    #[error("pixel buffer holds {actual} bytes but the image needs {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// A configuration value could not be parsed.
    #[error("invalid value {value:?} for {option}")]
    InvalidOption { option: &'static str, value: String },

    /// A worker of the parallel sorter stopped before answering.
    #[error("worker pool failure: {0}")]
    WorkerPool(&'static str),

    /// Decoding or encoding through the `image` crate failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type SortResult<T> = Result<T, SortError>;
