//! Error types for the auto-framing engine.
//!
//! The per-frame math never fails; these errors only surface at the edges of the
//! crate: configuration checks, raw frame ingestion and the async service.

use thiserror::Error;

/// Result type for auto-framing operations.
pub type FocusResult<T> = Result<T, FocusError>;

/// Errors that can occur while configuring or driving the pipeline.
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("{name} = {value} is outside the supported range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("aggregation grid must be at least {min} samples per axis, got {actual}")]
    GridTooSmall { actual: u32, min: u32 },

    #[error("reduction factor must be at least 1")]
    ZeroReduction,

    #[error("frame buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA frame")]
    FrameSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("focus service is no longer running")]
    ServiceClosed,

    #[error("focus worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FocusError {
    /// Create a range violation for a named parameter.
    pub fn out_of_range(name: &'static str, value: f32, min: f32, max: f32) -> Self {
        Self::OutOfRange {
            name,
            value,
            min,
            max,
        }
    }
}
