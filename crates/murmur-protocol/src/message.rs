//! Messages exchanged between nodes.
//!
//! All message types are immutable once created: a knowledge message carries
//! a *snapshot* of the sender's store at send time, so later store mutations
//! never retroactively change a message in flight.

use serde::{Deserialize, Serialize};

use crate::knowledge::Knowledge;

/// Opaque unique node identifier, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Delivery delay assigned to a message by the fault injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delay {
    /// Delivered in the current round's integrate phase.
    Immediate,
    /// Delivered one round later.
    Short,
    /// Delivered two rounds later.
    Long,
}

impl Delay {
    /// Number of rounds the delivery is deferred.
    #[must_use]
    pub fn rounds(self) -> u64 {
        match self {
            Self::Immediate => 0,
            Self::Short => 1,
            Self::Long => 2,
        }
    }

    /// Inverse of [`Delay::rounds`] for in-range values.
    #[must_use]
    pub fn from_rounds(rounds: u64) -> Option<Self> {
        match rounds {
            0 => Some(Self::Immediate),
            1 => Some(Self::Short),
            2 => Some(Self::Long),
            _ => None,
        }
    }
}

/// A knowledge-sharing message: the sender's full store snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeMessage {
    pub from: NodeId,
    pub to: NodeId,
    /// Round in which the message was sent.
    pub round: u64,
    pub knowledge: Knowledge,
}

impl KnowledgeMessage {
    /// Round in which the message becomes deliverable given its delay.
    #[must_use]
    pub fn due_round(&self, delay: Delay) -> u64 {
        self.round + delay.rounds()
    }
}

/// A termination signal: a single-bit notice with no payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeathNotice {
    pub from: NodeId,
    pub to: NodeId,
}

/// Terminal report delivered to the supervisor by a converged node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub from: NodeId,
    pub average: f64,
    pub known_sources: usize,
}

/// Message payload routed between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    Knowledge(KnowledgeMessage),
    Death(DeathNotice),
}

/// A payload tagged with the delay outcome drawn at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub delay: Delay,
    pub payload: Payload,
}

impl Envelope {
    /// Wrap a knowledge message.
    #[must_use]
    pub fn knowledge(message: KnowledgeMessage, delay: Delay) -> Self {
        Self {
            delay,
            payload: Payload::Knowledge(message),
        }
    }

    /// Wrap a death notice.
    #[must_use]
    pub fn death(notice: DeathNotice, delay: Delay) -> Self {
        Self {
            delay,
            payload: Payload::Death(notice),
        }
    }

    /// The node this envelope is addressed to.
    #[must_use]
    pub fn recipient(&self) -> NodeId {
        match &self.payload {
            Payload::Knowledge(msg) => msg.to,
            Payload::Death(notice) => notice.to,
        }
    }
}
