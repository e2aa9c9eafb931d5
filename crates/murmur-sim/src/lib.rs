//! Murmur Simulation Drivers
//!
//! Runs the epidemic averaging protocol over a fixed topology under two
//! equivalent execution models:
//!
//! - **Sequential**: a single control flow steps every node through
//!   broadcast and integrate each round. Fully deterministic for a seed;
//!   the reference behavior.
//! - **Concurrent**: one tokio task per node, synchronized by a two-stage
//!   barrier ([`RoundCoordinator`]) with a bounded receive window per round.
//!
//! Both models produce the same node-state trajectory for the same message
//! schedule; the accepted report is the first converged node's local view.
//!
//! The [`voting`] module carries the continuous-dynamics sibling protocol,
//! where scalar states relax toward the average instead of gossiping
//! knowledge snapshots.
//!
//! # Usage
//!
//! ```
//! use murmur_sim::{run_sequential, SimulationConfig};
//! use murmur_topology::path;
//!
//! let values = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let result = run_sequential(&path(5), &values, &SimulationConfig::default()).unwrap();
//! assert_eq!(result.report.known_sources, 5);
//! ```

mod concurrent;
mod config;
mod coordinator;
mod error;
mod sequential;
pub mod voting;

pub use concurrent::run_concurrent;
pub use config::{SimulationConfig, SimulationResult};
pub use coordinator::{Phase, RoundCoordinator};
pub use error::{Error, Result};
pub use sequential::run_sequential;
pub use voting::{run_voting, VotingConfig, VotingOutcome};
