//! The node state machine.
//!
//! A node owns one value, a grow-only knowledge store, its neighbor list and
//! two delay lines (knowledge and death notices). Each round it broadcasts
//! its full knowledge snapshot to every neighbor, then integrates whatever
//! became due in its inbox.
//!
//! # Lifecycle
//!
//! ```text
//! ACTIVE --(no new sources heard, or a neighbor died)--> PENDING_TERMINATION
//! PENDING_TERMINATION --(death notices + report sent)--> SILENT
//! ```
//!
//! A node that hears no new information has converged locally and starts its
//! own termination wave. A node that hears of a dead neighbor joins the wave
//! immediately, regardless of its own convergence, so the wave outruns
//! normal gossip and every reachable node eventually goes silent.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::delay::DelayLine;
use crate::fault::{FaultInjector, SendOutcome};
use crate::knowledge::{Knowledge, ValueMode};
use crate::ledger::{CostLedger, CostSchedule};
use crate::message::{DeathNotice, Delay, Envelope, KnowledgeMessage, NodeId, Payload};
use crate::supervisor::Supervisor;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Gossiping knowledge every round.
    Active,
    /// Converged; will flood death notices and report on its next broadcast.
    PendingTermination,
    /// Done. Contributes nothing and costs nothing.
    Silent,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::PendingTermination => write!(f, "PendingTermination"),
            Self::Silent => write!(f, "Silent"),
        }
    }
}

/// One participant in the averaging protocol.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    value: f64,
    knowledge: Knowledge,
    neighbors: Vec<NodeId>,
    state: NodeState,
    confirmed_dead: BTreeSet<NodeId>,
    knowledge_line: DelayLine<KnowledgeMessage>,
    death_line: DelayLine<DeathNotice>,
}

impl Node {
    /// Create a node with its fixed neighbor list.
    ///
    /// The neighbor set mirrors the undirected topology and is never
    /// mutated afterward.
    #[must_use]
    pub fn new(id: NodeId, value: f64, neighbors: Vec<NodeId>, mode: ValueMode) -> Self {
        Self {
            id,
            value,
            knowledge: Knowledge::new(mode, id, value),
            neighbors,
            state: NodeState::Active,
            confirmed_dead: BTreeSet::new(),
            knowledge_line: DelayLine::new(),
            death_line: DelayLine::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.state == NodeState::Silent
    }

    #[must_use]
    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    #[must_use]
    pub fn known_sources(&self) -> usize {
        self.knowledge.len()
    }

    #[must_use]
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Broadcast phase for `round`.
    ///
    /// - ACTIVE: one knowledge snapshot per neighbor, each independently
    ///   noised and routed by the fault injector, each charged whether or
    ///   not it survives (cost models bandwidth spent, not success).
    /// - PENDING_TERMINATION: death notices to neighbors not already known
    ///   dead, plus the terminal report to the supervisor; then SILENT.
    /// - SILENT: nothing.
    ///
    /// Returns the envelopes to route to peers.
    pub fn broadcast(
        &mut self,
        round: u64,
        faults: &mut FaultInjector,
        ledger: &CostLedger,
        supervisor: &Supervisor,
        costs: &CostSchedule,
    ) -> Vec<Envelope> {
        match self.state {
            NodeState::Active => self.broadcast_knowledge(round, faults, ledger, costs),
            NodeState::PendingTermination => {
                let out = self.broadcast_death(faults, ledger, costs);
                self.submit_report(supervisor, ledger, costs);
                self.state = NodeState::Silent;
                debug!(id = %self.id, round, "node went silent");
                out
            }
            NodeState::Silent => Vec::new(),
        }
    }

    fn broadcast_knowledge(
        &mut self,
        round: u64,
        faults: &mut FaultInjector,
        ledger: &CostLedger,
        costs: &CostSchedule,
    ) -> Vec<Envelope> {
        let mut out = Vec::with_capacity(self.neighbors.len());
        for &neighbor in &self.neighbors {
            ledger.add(costs.neighbor_message);
            match faults.send_outcome() {
                SendOutcome::Drop => {
                    trace!(id = %self.id, to = %neighbor, round, "knowledge message dropped");
                }
                SendOutcome::Deliver(delay) => {
                    let mut snapshot = self.knowledge.clone();
                    faults.corrupt(&mut snapshot);
                    out.push(Envelope::knowledge(
                        KnowledgeMessage {
                            from: self.id,
                            to: neighbor,
                            round,
                            knowledge: snapshot,
                        },
                        delay,
                    ));
                }
            }
        }
        out
    }

    fn broadcast_death(
        &mut self,
        faults: &mut FaultInjector,
        ledger: &CostLedger,
        costs: &CostSchedule,
    ) -> Vec<Envelope> {
        let mut out = Vec::new();
        for &neighbor in &self.neighbors {
            if self.confirmed_dead.contains(&neighbor) {
                continue;
            }
            ledger.add(costs.neighbor_message);
            match faults.send_outcome() {
                SendOutcome::Drop => {
                    trace!(id = %self.id, to = %neighbor, "death notice dropped");
                }
                SendOutcome::Deliver(delay) => {
                    out.push(Envelope::death(
                        DeathNotice {
                            from: self.id,
                            to: neighbor,
                        },
                        delay,
                    ));
                }
            }
        }
        out
    }

    fn submit_report(&self, supervisor: &Supervisor, ledger: &CostLedger, costs: &CostSchedule) {
        ledger.add(costs.supervisor_message);
        supervisor.submit(self.knowledge.report(self.id));
    }

    /// Accept an inbound envelope, staging it for the round it is due.
    ///
    /// A knowledge message is due in `sent round + delay`; one whose due
    /// round already passed is mistimed and silently discarded. Death
    /// notices carry no round and are staged by their delay tag alone.
    pub fn accept(&mut self, envelope: Envelope, current_round: u64) {
        match envelope.payload {
            Payload::Knowledge(message) => {
                let due = message.due_round(envelope.delay);
                let Some(remaining) = due
                    .checked_sub(current_round)
                    .and_then(Delay::from_rounds)
                else {
                    trace!(
                        id = %self.id,
                        from = %message.from,
                        due,
                        current_round,
                        "discarding mistimed knowledge message"
                    );
                    return;
                };
                self.knowledge_line.stage(message, remaining);
            }
            Payload::Death(notice) => {
                self.death_line.stage(notice, envelope.delay);
            }
        }
    }

    /// Integrate phase for `round`.
    ///
    /// Merges due knowledge into the store, drains due death notices into
    /// the confirmed-dead set, advances both delay lines, then applies the
    /// state transition rule. Returns whether any new source id was learned.
    pub fn integrate(&mut self, round: u64) -> bool {
        if self.state == NodeState::Silent {
            return false;
        }

        let mut updated = false;
        for message in self.knowledge_line.drain_due() {
            if self.knowledge.merge(&message.knowledge) {
                updated = true;
            }
        }
        for notice in self.death_line.drain_due() {
            self.confirmed_dead.insert(notice.from);
        }
        self.knowledge_line.advance();
        self.death_line.advance();

        if self.state == NodeState::Active {
            if !self.confirmed_dead.is_empty() {
                // Death propagates outward before the node checks its own
                // convergence.
                self.state = NodeState::PendingTermination;
                debug!(id = %self.id, round, "joining termination wave");
            } else if !updated {
                self.state = NodeState::PendingTermination;
                debug!(id = %self.id, round, known = self.knowledge.len(), "converged locally");
            }
        }
        updated
    }

    /// Shut the node down on a global stop.
    ///
    /// A node caught in PENDING_TERMINATION still owes its terminal report;
    /// it submits it (first-writer-wins dedups) and goes silent without
    /// another broadcast round.
    pub fn finalize(
        &mut self,
        supervisor: &Supervisor,
        ledger: &CostLedger,
        costs: &CostSchedule,
    ) {
        if self.state == NodeState::PendingTermination {
            self.submit_report(supervisor, ledger, costs);
            self.state = NodeState::Silent;
            debug!(id = %self.id, "node went silent at global stop");
        }
    }
}
