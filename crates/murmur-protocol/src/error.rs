//! Error types for murmur-protocol.

use thiserror::Error;

/// Result type for murmur-protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring the protocol.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Delay-outcome weights do not form a usable distribution.
    #[error("delay weights must be non-negative with a positive sum (got {immediate}, {short}, {long})")]
    InvalidDelayWeights {
        immediate: f64,
        short: f64,
        long: f64,
    },

    /// Drop probability outside [0, 1].
    #[error("drop probability must be within [0, 1], got {0}")]
    InvalidDropProbability(f64),

    /// Noise standard deviation is negative or non-finite.
    #[error("noise sigma must be finite and non-negative, got {0}")]
    InvalidNoiseSigma(f64),
}
