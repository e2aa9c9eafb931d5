//! Concurrent driver: one task per node.
//!
//! Nodes communicate only through per-node inbox channels; the
//! [`RoundCoordinator`] barrier supplies the one cross-node ordering
//! guarantee (no integrate before every broadcast of the round, no next
//! broadcast before every integrate). Within a phase, task order is
//! unobservable.
//!
//! Each node drains its inbox under a bounded receive window: once the
//! deadline passes it integrates whatever has arrived rather than stalling
//! the barrier on a message that may never come.

use std::sync::Arc;
use std::time::Duration;

use murmur_protocol::{
    CostLedger, CostSchedule, Envelope, FaultInjector, Node, Supervisor,
};
use murmur_topology::Topology;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::trace;

use crate::config::{build_nodes, validate, SimulationConfig, SimulationResult};
use crate::coordinator::RoundCoordinator;
use crate::error::{Error, Result};

/// Run the protocol with every node independently scheduled.
///
/// Produces the same node-state trajectory as the sequential driver for the
/// same message schedule; timing (and therefore per-node noise draws) may
/// differ, so cross-model comparisons belong in fault-free runs.
pub async fn run_concurrent(
    topology: &Topology,
    values: &[f64],
    config: &SimulationConfig,
) -> Result<SimulationResult> {
    validate(topology, values)?;

    let n = topology.node_count();
    let ledger = Arc::new(CostLedger::new());
    let supervisor = Arc::new(Supervisor::new());
    let coordinator = Arc::new(RoundCoordinator::new(n, config.round_limit_for(topology)));

    let mut senders = Vec::with_capacity(n);
    let mut receivers = Vec::with_capacity(n);
    for _ in 0..n {
        let (tx, rx) = mpsc::unbounded_channel::<Envelope>();
        senders.push(tx);
        receivers.push(rx);
    }

    let mut tasks = Vec::with_capacity(n);
    for (i, (node, inbox)) in build_nodes(topology, values, config.mode)
        .into_iter()
        .zip(receivers)
        .enumerate()
    {
        // Each node gets its own injector stream derived from the run seed,
        // so a run is reproducible regardless of task interleaving.
        let faults = FaultInjector::new(config.faults, config.seed.wrapping_add(i as u64))?;
        tasks.push(tokio::spawn(node_task(NodeTask {
            node,
            faults,
            inbox,
            peers: senders.clone(),
            coordinator: Arc::clone(&coordinator),
            ledger: Arc::clone(&ledger),
            supervisor: Arc::clone(&supervisor),
            costs: config.costs,
            receive_window: config.receive_window,
        })));
    }
    drop(senders);

    for task in tasks {
        task.await.expect("node task panicked");
    }

    if coordinator.stalled() {
        return Err(Error::Stalled {
            rounds: coordinator.rounds_completed(),
        });
    }
    let report = supervisor.result().ok_or(Error::MissingReport)?;
    Ok(SimulationResult {
        report,
        total_cost: ledger.total(),
        rounds: coordinator.rounds_completed(),
    })
}

struct NodeTask {
    node: Node,
    faults: FaultInjector,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    peers: Vec<mpsc::UnboundedSender<Envelope>>,
    coordinator: Arc<RoundCoordinator>,
    ledger: Arc<CostLedger>,
    supervisor: Arc<Supervisor>,
    costs: CostSchedule,
    receive_window: Duration,
}

async fn node_task(mut task: NodeTask) {
    loop {
        let Some(round) = task.coordinator.wait_broadcast().await else {
            task.node
                .finalize(&task.supervisor, &task.ledger, &task.costs);
            return;
        };

        let envelopes = task.node.broadcast(
            round,
            &mut task.faults,
            &task.ledger,
            &task.supervisor,
            &task.costs,
        );
        for envelope in envelopes {
            let to = envelope.recipient().0 as usize;
            // A silent peer has dropped its inbox; losing the message is
            // indistinguishable from sending to a node that ignores it.
            let _ = task.peers[to].send(envelope);
        }
        task.coordinator.complete_broadcast();

        let Some(round) = task.coordinator.wait_integrate().await else {
            task.node
                .finalize(&task.supervisor, &task.ledger, &task.costs);
            return;
        };

        receive_until_deadline(&mut task, round).await;

        let updated = task.node.integrate(round);
        let leaving = task.node.is_silent();
        task.coordinator.complete_integrate(updated, leaving);
        if leaving {
            return;
        }
    }
}

/// Drain the inbox until the receive window closes.
///
/// The window bounds per-round latency: a node blocked on a message that
/// never arrives proceeds with what it has instead of stalling the barrier.
async fn receive_until_deadline(task: &mut NodeTask, round: u64) {
    let id = task.node.id();
    let deadline = Instant::now() + task.receive_window;
    loop {
        match timeout_at(deadline, task.inbox.recv()).await {
            Ok(Some(envelope)) => task.node.accept(envelope, round),
            Ok(None) => return,
            Err(_) => {
                trace!(%id, round, "receive window closed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_protocol::NodeId;
    use murmur_topology::{complete, path};

    fn fast_config() -> SimulationConfig {
        SimulationConfig::default().with_receive_window(Duration::from_millis(20))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn path_average_matches_reference() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let result = run_concurrent(&path(5), &values, &fast_config())
            .await
            .unwrap();

        assert_eq!(result.report.from, NodeId(2));
        assert_eq!(result.report.known_sources, 5);
        assert!((result.report.average - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn complete_graph_stops_after_saturation() {
        let values = [4.0, 5.0, 6.0, 7.0];
        let result = run_concurrent(&complete(4), &values, &fast_config())
            .await
            .unwrap();

        assert_eq!(result.rounds, 2);
        assert_eq!(result.report.known_sources, 4);
        assert!((result.report.average - 5.5).abs() < f64::EPSILON);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disconnected_topology_is_refused() {
        let split = murmur_topology::Topology::from_matrix(&[
            vec![0, 1, 0, 0],
            vec![1, 0, 0, 0],
            vec![0, 0, 0, 1],
            vec![0, 0, 1, 0],
        ])
        .unwrap();
        let err = run_concurrent(&split, &[0.0; 4], &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Disconnected));
    }
}
