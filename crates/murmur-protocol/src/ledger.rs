//! Communication cost accounting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default cost of one message to a neighbor.
pub const DEFAULT_NEIGHBOR_MESSAGE_COST: u64 = 10;

/// Default cost of one report to the supervisor.
pub const DEFAULT_SUPERVISOR_MESSAGE_COST: u64 = 1000;

/// Per-message cost constants for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    /// Charged per attempted send to a neighbor (knowledge or death notice).
    pub neighbor_message: u64,
    /// Charged per report sent to the supervisor.
    pub supervisor_message: u64,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            neighbor_message: DEFAULT_NEIGHBOR_MESSAGE_COST,
            supervisor_message: DEFAULT_SUPERVISOR_MESSAGE_COST,
        }
    }
}

/// Thread-safe accumulator of communication cost.
///
/// Addition is commutative, so concurrent increments from many nodes need no
/// ordering beyond atomicity.
#[derive(Debug, Default)]
pub struct CostLedger {
    total: AtomicU64,
}

impl CostLedger {
    /// Create a ledger at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically add `amount` to the running total.
    pub fn add(&self, amount: u64) {
        self.total.fetch_add(amount, Ordering::Relaxed);
    }

    /// The accumulated total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn accumulates_adds() {
        let ledger = CostLedger::new();
        assert_eq!(ledger.total(), 0);
        ledger.add(10);
        ledger.add(1000);
        assert_eq!(ledger.total(), 1010);
    }

    #[test]
    fn concurrent_adds_are_lossless() {
        let ledger = Arc::new(CostLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        ledger.add(3);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.total(), 8 * 1000 * 3);
    }

    #[test]
    fn default_schedule_matches_constants() {
        let costs = CostSchedule::default();
        assert_eq!(costs.neighbor_message, DEFAULT_NEIGHBOR_MESSAGE_COST);
        assert_eq!(costs.supervisor_message, DEFAULT_SUPERVISOR_MESSAGE_COST);
    }
}
