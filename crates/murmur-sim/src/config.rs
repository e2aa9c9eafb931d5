//! Simulation configuration and results.

use std::time::Duration;

use murmur_protocol::{CostSchedule, FaultProfile, Node, NodeId, Report, ValueMode};
use murmur_topology::Topology;

use crate::error::{Error, Result};

/// Configuration shared by both execution models.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Value representation of the knowledge stores.
    pub mode: ValueMode,
    /// Per-message cost constants.
    pub costs: CostSchedule,
    /// Fault-injection parameters.
    pub faults: FaultProfile,
    /// How long a node waits for inbound messages each round in the
    /// concurrent model before proceeding with whatever arrived.
    pub receive_window: Duration,
    /// Seed for every randomized decision; equal seeds reproduce runs.
    pub seed: u64,
    /// Hard cap on rounds; derived from the graph diameter when `None`.
    pub round_limit: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: ValueMode::Exact,
            costs: CostSchedule::default(),
            faults: FaultProfile::default(),
            receive_window: Duration::from_millis(500),
            seed: 42,
            round_limit: None,
        }
    }
}

impl SimulationConfig {
    /// Set the knowledge-store value mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the per-message cost constants.
    #[must_use]
    pub fn with_costs(mut self, costs: CostSchedule) -> Self {
        self.costs = costs;
        self
    }

    /// Set the fault-injection profile.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultProfile) -> Self {
        self.faults = faults;
        self
    }

    /// Set the receive window for the concurrent model.
    #[must_use]
    pub fn with_receive_window(mut self, window: Duration) -> Self {
        self.receive_window = window;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the derived round limit.
    #[must_use]
    pub fn with_round_limit(mut self, limit: u64) -> Self {
        self.round_limit = Some(limit);
        self
    }

    /// The effective round cap for `topology`.
    ///
    /// Knowledge saturates within the graph diameter and the termination
    /// wave needs about as long again, so anything past `4 x diameter + 16`
    /// is a stall, not slow convergence.
    #[must_use]
    pub fn round_limit_for(&self, topology: &Topology) -> u64 {
        self.round_limit.unwrap_or_else(|| {
            let diameter = topology.diameter().unwrap_or(0) as u64;
            4 * diameter + 16
        })
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// The accepted terminal report (first reporter wins).
    pub report: Report,
    /// Total accumulated communication cost.
    pub total_cost: u64,
    /// Rounds processed before quiescence.
    pub rounds: u64,
}

/// Check the run preconditions common to both drivers.
pub(crate) fn validate(topology: &Topology, values: &[f64]) -> Result<()> {
    if topology.node_count() == 0 {
        return Err(Error::NoNodes);
    }
    if values.len() != topology.node_count() {
        return Err(Error::ValueCountMismatch {
            nodes: topology.node_count(),
            values: values.len(),
        });
    }
    if !topology.is_connected() {
        return Err(Error::Disconnected);
    }
    Ok(())
}

/// Build the node table from the topology and initial values.
pub(crate) fn build_nodes(topology: &Topology, values: &[f64], mode: ValueMode) -> Vec<Node> {
    (0..topology.node_count())
        .map(|i| {
            let neighbors = topology
                .neighbors(i)
                .iter()
                .map(|&j| NodeId(j as u64))
                .collect();
            Node::new(NodeId(i as u64), values[i], neighbors, mode)
        })
        .collect()
}
