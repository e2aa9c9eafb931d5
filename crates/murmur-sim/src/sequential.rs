//! Single-threaded reference driver.
//!
//! One control flow invokes broadcast on every node, then integrate on every
//! node, round after round until the graph quiesces. Fully deterministic for
//! a given seed, which makes it the reference the concurrent model is
//! checked against.

use murmur_protocol::{CostLedger, FaultInjector, Node, Supervisor};
use murmur_topology::Topology;
use tracing::debug;

use crate::config::{build_nodes, validate, SimulationConfig, SimulationResult};
use crate::error::{Error, Result};

/// Run the protocol to quiescence on the current thread.
pub fn run_sequential(
    topology: &Topology,
    values: &[f64],
    config: &SimulationConfig,
) -> Result<SimulationResult> {
    validate(topology, values)?;

    let mut faults = FaultInjector::new(config.faults, config.seed)?;
    let ledger = CostLedger::new();
    let supervisor = Supervisor::new();
    let costs = config.costs;
    let mut nodes = build_nodes(topology, values, config.mode);
    let round_limit = config.round_limit_for(topology);

    let mut round = 0u64;
    while !nodes.iter().all(Node::is_silent) {
        round += 1;
        if round > round_limit {
            return Err(Error::Stalled {
                rounds: round_limit,
            });
        }

        // Broadcast phase: collect each node's envelopes and route them into
        // the recipients' delay lines.
        for i in 0..nodes.len() {
            let envelopes = nodes[i].broadcast(round, &mut faults, &ledger, &supervisor, &costs);
            for envelope in envelopes {
                let to = envelope.recipient().0 as usize;
                nodes[to].accept(envelope, round);
            }
        }

        // Integrate phase.
        let mut any_updates = false;
        for node in &mut nodes {
            if node.integrate(round) {
                any_updates = true;
            }
        }
        debug!(round, any_updates, "round complete");

        if !any_updates {
            // Global stop: every node that just converged still owes its
            // terminal report.
            for node in &mut nodes {
                node.finalize(&supervisor, &ledger, &costs);
            }
            break;
        }
    }

    let report = supervisor.result().ok_or(Error::MissingReport)?;
    Ok(SimulationResult {
        report,
        total_cost: ledger.total(),
        rounds: round,
    })
}
