//! Continuous local-voting dynamics.
//!
//! The gossip protocol's continuous-dynamics sibling: instead of flooding
//! knowledge snapshots, every node nudges its scalar state toward its
//! neighbors each step,
//!
//! ```text
//! x_i <- x_i + alpha * sum_j b_ij * (y_ij - y_ii)
//! ```
//!
//! where `y` are (possibly noisy, possibly stale) state measurements and
//! `b_ij` switches off when the link drops this step. States converge toward
//! the initial average on any connected graph when `alpha` is small enough.
//! There is no termination wave here: the dynamics run for a fixed number of
//! iterations, and the drop probability of the fault profile is the link
//! failure rate.

use murmur_protocol::{CostLedger, CostSchedule, FaultInjector, FaultProfile};
use murmur_topology::Topology;
use tracing::debug;

use crate::config::validate;
use crate::error::Result;

/// Configuration for one voting run.
#[derive(Debug, Clone, Copy)]
pub struct VotingConfig {
    /// Protocol step size; must be below `1 / max_degree` for stability.
    pub alpha: f64,
    /// Maximum staleness, in steps, of a neighbor state measurement.
    /// Zero reads current states; faulty links typically pair this with
    /// drops and noise.
    pub max_delay: usize,
    /// Number of protocol steps to run.
    pub iterations: usize,
    /// Noise sigma (additive measurement noise) and drop probability
    /// (per-link, per-step failure).
    pub faults: FaultProfile,
    /// Per-message cost constants.
    pub costs: CostSchedule,
    /// Seed for every randomized decision.
    pub seed: u64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            max_delay: 0,
            iterations: 100,
            faults: FaultProfile::default(),
            costs: CostSchedule::default(),
            seed: 42,
        }
    }
}

impl VotingConfig {
    /// Set the step size.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the maximum measurement staleness.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: usize) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the fault profile.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultProfile) -> Self {
        self.faults = faults;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a voting run.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingOutcome {
    /// Per-node state trajectory, one entry per step including the start.
    pub trajectories: Vec<Vec<f64>>,
    /// The exact mean of the initial values.
    pub true_average: f64,
    /// Total accumulated communication cost.
    pub total_cost: u64,
}

impl VotingOutcome {
    /// The final state of every node.
    #[must_use]
    pub fn final_states(&self) -> Vec<f64> {
        self.trajectories
            .iter()
            .map(|history| *history.last().unwrap_or(&0.0))
            .collect()
    }
}

/// Run the voting dynamics for a fixed number of steps.
///
/// All nodes update synchronously from the previous step's histories. Each
/// surviving link costs one neighbor message per step, and the final result
/// readout is charged as one supervisor message.
pub fn run_voting(
    topology: &Topology,
    initial: &[f64],
    config: &VotingConfig,
) -> Result<VotingOutcome> {
    validate(topology, initial)?;

    let n = topology.node_count();
    let mut faults = FaultInjector::new(config.faults, config.seed)?;
    let ledger = CostLedger::new();
    let mut histories: Vec<Vec<f64>> = initial.iter().map(|&x| vec![x]).collect();
    let true_average = initial.iter().sum::<f64>() / n as f64;

    for step in 1..=config.iterations {
        let mut next = Vec::with_capacity(n);
        for i in 0..n {
            let x_i = *histories[i].last().unwrap_or(&0.0);
            let y_ii = faults.measure(x_i);
            let mut control = 0.0;
            for &j in topology.neighbors(i) {
                if !faults.link_up() {
                    continue;
                }
                ledger.add(config.costs.neighbor_message);
                let staleness = faults.history_delay(config.max_delay);
                let history = &histories[j];
                let index = history.len().saturating_sub(1 + staleness);
                let y_ij = faults.measure(history[index]);
                control += y_ij - y_ii;
            }
            next.push(x_i + config.alpha * control);
        }
        for (history, x) in histories.iter_mut().zip(next) {
            history.push(x);
        }
        debug!(step, "voting step complete");
    }

    ledger.add(config.costs.supervisor_message);
    Ok(VotingOutcome {
        trajectories: histories,
        true_average,
        total_cost: ledger.total(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_topology::{path, ring};

    #[test]
    fn ideal_dynamics_converge_to_the_mean() {
        let initial = [0.0, 1.0, 2.0, 3.0, 4.0];
        let config = VotingConfig::default().with_iterations(200);
        let outcome = run_voting(&path(5), &initial, &config).unwrap();

        assert!((outcome.true_average - 2.0).abs() < f64::EPSILON);
        for state in outcome.final_states() {
            assert!(
                (state - 2.0).abs() < 0.05,
                "state {} did not converge",
                state
            );
        }
    }

    #[test]
    fn dynamics_preserve_the_sum_without_faults() {
        let initial = [5.0, -3.0, 1.0, 9.0];
        let outcome = run_voting(&ring(4), &initial, &VotingConfig::default()).unwrap();

        let total: f64 = outcome.final_states().iter().sum();
        assert!((total - 12.0).abs() < 1e-9);
    }

    #[test]
    fn trajectories_record_every_step() {
        let config = VotingConfig::default().with_iterations(17);
        let outcome = run_voting(&path(3), &[0.0, 1.0, 2.0], &config).unwrap();
        assert!(outcome.trajectories.iter().all(|h| h.len() == 18));
    }

    #[test]
    fn faulty_runs_still_land_near_the_mean() {
        let initial = [0.0, 1.0, 2.0, 3.0, 4.0];
        let faults = FaultProfile::default()
            .with_drop_probability(0.2)
            .with_noise_sigma(0.05);
        let config = VotingConfig::default()
            .with_iterations(400)
            .with_max_delay(2)
            .with_faults(faults)
            .with_seed(9);
        let outcome = run_voting(&ring(5), &initial, &config).unwrap();

        for state in outcome.final_states() {
            assert!(
                (state - outcome.true_average).abs() < 1.0,
                "state {} strayed from {}",
                state,
                outcome.true_average
            );
        }
    }

    #[test]
    fn cost_counts_surviving_links_per_step() {
        let config = VotingConfig::default().with_iterations(10);
        let outcome = run_voting(&path(3), &[0.0, 1.0, 2.0], &config).unwrap();

        // Path(3) has 4 directed link uses per step; no drops by default.
        let expected = 10 * 4 * config.costs.neighbor_message + config.costs.supervisor_message;
        assert_eq!(outcome.total_cost, expected);
    }

    #[test]
    fn same_seed_reproduces_trajectories() {
        let faults = FaultProfile::default()
            .with_drop_probability(0.3)
            .with_noise_sigma(0.5);
        let config = VotingConfig::default().with_faults(faults).with_seed(3);
        let a = run_voting(&path(4), &[0.0, 1.0, 2.0, 3.0], &config).unwrap();
        let b = run_voting(&path(4), &[0.0, 1.0, 2.0, 3.0], &config).unwrap();
        assert_eq!(a, b);
    }
}
