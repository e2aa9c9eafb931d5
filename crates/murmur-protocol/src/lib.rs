//! Epidemic Averaging Protocol
//!
//! N nodes each hold one value and must learn the average over a fixed,
//! possibly sparse communication graph without any node ever seeing the full
//! value set directly. Knowledge spreads by gossip: every round each node
//! sends its whole knowledge snapshot to every neighbor and merges whatever
//! arrived.
//!
//! # Termination Wave
//!
//! There is no central convergence detector. A node that hears no new source
//! in a round has converged locally: it floods death notices to its
//! neighbors, reports its average to the supervisor and goes silent. A node
//! that hears a death notice joins the wave immediately, so silence spreads
//! faster than gossip and the whole graph quiesces.
//!
//! # Fault Injection
//!
//! Every send is routed through a seeded [`FaultInjector`] that can delay a
//! message by one or two rounds (realized by each node's two-slot
//! [`DelayLine`]), drop it, or corrupt the payload with clamped
//! multiplicative noise. The same seed always reproduces the same run.
//!
//! # Shared State
//!
//! The only cross-node mutable state is each node's inbox, the [`CostLedger`]
//! (atomic add, commutative) and the [`Supervisor`] report slot (write-once,
//! first writer wins).

mod delay;
mod error;
mod fault;
mod knowledge;
mod ledger;
mod message;
mod node;
mod supervisor;

pub use delay::DelayLine;
pub use error::{Error, Result};
pub use fault::{DelayWeights, FaultInjector, FaultProfile, SendOutcome, NOISE_CLAMP};
pub use knowledge::{Knowledge, ValueMode};
pub use ledger::{
    CostLedger, CostSchedule, DEFAULT_NEIGHBOR_MESSAGE_COST, DEFAULT_SUPERVISOR_MESSAGE_COST,
};
pub use message::{DeathNotice, Delay, Envelope, KnowledgeMessage, NodeId, Payload, Report};
pub use node::{Node, NodeState};
pub use supervisor::Supervisor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_state_display() {
        assert_eq!(format!("{}", NodeState::Active), "Active");
        assert_eq!(
            format!("{}", NodeState::PendingTermination),
            "PendingTermination"
        );
        assert_eq!(format!("{}", NodeState::Silent), "Silent");
    }

    #[test]
    fn fresh_node_knows_only_itself() {
        let node = Node::new(NodeId(4), 2.5, vec![NodeId(3), NodeId(5)], ValueMode::Exact);
        assert_eq!(node.known_sources(), 1);
        assert_eq!(node.knowledge().value_of(NodeId(4)), Some(2.5));
        assert_eq!(node.state(), NodeState::Active);
    }
}
