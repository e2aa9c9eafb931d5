//! Error types for murmur-sim.

use thiserror::Error;

/// Result type for murmur-sim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// The fault configuration was invalid.
    #[error("invalid fault configuration: {0}")]
    Protocol(#[from] murmur_protocol::Error),

    /// The protocol requires a connected graph; refusing to run on one that
    /// could only ever produce a partial average.
    #[error("topology is disconnected")]
    Disconnected,

    /// There is nothing to average.
    #[error("simulation requires at least one node")]
    NoNodes,

    /// Initial values do not line up with the topology.
    #[error("topology has {nodes} nodes but {values} initial values were supplied")]
    ValueCountMismatch { nodes: usize, values: usize },

    /// The run exceeded its round limit without quiescing.
    #[error("simulation stalled: no quiescence within {rounds} rounds")]
    Stalled { rounds: u64 },

    /// The run quiesced but no node ever reported.
    #[error("simulation ended without an accepted report")]
    MissingReport,
}
