//! Two-stage barrier for the concurrent model.
//!
//! Every node is an independently scheduled task; the coordinator is the
//! only piece of shared phase state (no ambient globals). Each round has two
//! gates: integrate opens once every non-silent node finished broadcasting,
//! and the next round's broadcast opens once every non-silent node finished
//! integrating. If a whole integrate phase passes without any node learning
//! a new source, the coordinator raises a global stop; nodes observe it the
//! next time they wait on a gate and proceed directly to shutdown.
//!
//! Nodes that went silent leave the barrier with their final integrate
//! completion, so later rounds only count the nodes still playing.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, trace};

/// Phase of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Broadcast,
    Integrate,
}

/// Gate state published to every waiting node.
#[derive(Debug, Clone, Copy)]
struct Gate {
    round: u64,
    phase: Phase,
    stopped: bool,
}

#[derive(Debug)]
struct Counters {
    participants: usize,
    senders_remaining: usize,
    integrators_remaining: usize,
    any_updates: bool,
    round: u64,
    round_limit: u64,
    stalled: bool,
}

/// Drives the global broadcast -> integrate cadence across node tasks.
#[derive(Debug)]
pub struct RoundCoordinator {
    counters: Mutex<Counters>,
    gate: watch::Sender<Gate>,
}

impl RoundCoordinator {
    /// Create a coordinator for `participants` nodes, capping the run at
    /// `round_limit` rounds.
    #[must_use]
    pub fn new(participants: usize, round_limit: u64) -> Self {
        let (gate, _) = watch::channel(Gate {
            round: 1,
            phase: Phase::Broadcast,
            stopped: participants == 0,
        });
        Self {
            counters: Mutex::new(Counters {
                participants,
                senders_remaining: participants,
                integrators_remaining: participants,
                any_updates: false,
                round: 1,
                round_limit,
                stalled: false,
            }),
            gate,
        }
    }

    /// Wait until this round's broadcast phase is open.
    ///
    /// Returns the round number, or `None` once the global stop is raised.
    pub async fn wait_broadcast(&self) -> Option<u64> {
        let mut rx = self.gate.subscribe();
        let gate = *rx
            .wait_for(|g| g.stopped || g.phase == Phase::Broadcast)
            .await
            .ok()?;
        if gate.stopped {
            None
        } else {
            Some(gate.round)
        }
    }

    /// Signal that this node finished broadcasting.
    pub fn complete_broadcast(&self) {
        let mut counters = self.counters.lock().expect("coordinator lock poisoned");
        counters.senders_remaining -= 1;
        trace!(
            round = counters.round,
            remaining = counters.senders_remaining,
            "broadcast completed"
        );
        if counters.senders_remaining == 0 {
            debug!(round = counters.round, "integrate phase open");
            self.gate.send_modify(|g| g.phase = Phase::Integrate);
        }
    }

    /// Wait until this round's integrate phase is open.
    pub async fn wait_integrate(&self) -> Option<u64> {
        let mut rx = self.gate.subscribe();
        let gate = *rx
            .wait_for(|g| g.stopped || g.phase == Phase::Integrate)
            .await
            .ok()?;
        if gate.stopped {
            None
        } else {
            Some(gate.round)
        }
    }

    /// Signal that this node finished integrating.
    ///
    /// `updated` feeds the global-stop rule; `leaving` removes the node from
    /// every later barrier (it has gone silent).
    pub fn complete_integrate(&self, updated: bool, leaving: bool) {
        let mut counters = self.counters.lock().expect("coordinator lock poisoned");
        if updated {
            counters.any_updates = true;
        }
        if leaving {
            counters.participants -= 1;
        }
        counters.integrators_remaining -= 1;
        if counters.integrators_remaining > 0 {
            return;
        }

        if !counters.any_updates || counters.participants == 0 {
            debug!(round = counters.round, "global stop raised");
            self.gate.send_modify(|g| g.stopped = true);
        } else if counters.round >= counters.round_limit {
            counters.stalled = true;
            self.gate.send_modify(|g| g.stopped = true);
        } else {
            counters.round += 1;
            counters.senders_remaining = counters.participants;
            counters.integrators_remaining = counters.participants;
            counters.any_updates = false;
            let round = counters.round;
            debug!(round, participants = counters.participants, "broadcast phase open");
            self.gate.send_modify(|g| {
                g.round = round;
                g.phase = Phase::Broadcast;
            });
        }
    }

    /// Rounds processed so far (the last round whose phases ran).
    #[must_use]
    pub fn rounds_completed(&self) -> u64 {
        self.counters.lock().expect("coordinator lock poisoned").round
    }

    /// Whether the run hit its round limit instead of quiescing.
    #[must_use]
    pub fn stalled(&self) -> bool {
        self.counters.lock().expect("coordinator lock poisoned").stalled
    }
}
