//! Grow-only knowledge stores.
//!
//! A store maps source ids to what the node has heard about them. It only
//! ever grows: keys are never removed and values never shrink. The two modes
//! differ in what a value is and how repeats merge:
//!
//! - **Exact**: one value per source, write-once. Later messages about a
//!   known source are ignored outright.
//! - **Observed**: an append-only sequence of observations per source, for
//!   runs where payload corruption is enabled. Every accepted observation is
//!   appended; averaging then takes each source's own mean first, so a
//!   source reached over many short paths cannot dominate the result.
//!
//! In both modes "did this merge teach us anything" means a new source id
//! was learned. Appended repeat observations alone never count, which is
//! what lets a node converge while noise keeps arriving.

// BTreeMap keeps iteration deterministic, which seeded noise draws rely on.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::message::{NodeId, Report};

/// How per-source values are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueMode {
    /// One scalar per source, write-once.
    Exact,
    /// Append-only observation sequence per source.
    Observed,
}

/// A node's knowledge about its peers' values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Knowledge {
    Exact(BTreeMap<NodeId, f64>),
    Observed(BTreeMap<NodeId, Vec<f64>>),
}

impl Knowledge {
    /// Create a store seeded with the node's own value.
    #[must_use]
    pub fn new(mode: ValueMode, source: NodeId, value: f64) -> Self {
        match mode {
            ValueMode::Exact => Self::Exact(BTreeMap::from([(source, value)])),
            ValueMode::Observed => Self::Observed(BTreeMap::from([(source, vec![value])])),
        }
    }

    /// The store's value representation mode.
    #[must_use]
    pub fn mode(&self) -> ValueMode {
        match self {
            Self::Exact(_) => ValueMode::Exact,
            Self::Observed(_) => ValueMode::Observed,
        }
    }

    /// Number of distinct sources known.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Exact(map) => map.len(),
            Self::Observed(map) => map.len(),
        }
    }

    /// Whether no source is known. Never true for a store built with
    /// [`Knowledge::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `source` is already known.
    #[must_use]
    pub fn contains(&self, source: NodeId) -> bool {
        match self {
            Self::Exact(map) => map.contains_key(&source),
            Self::Observed(map) => map.contains_key(&source),
        }
    }

    /// The stored value for `source` in exact mode.
    #[must_use]
    pub fn value_of(&self, source: NodeId) -> Option<f64> {
        match self {
            Self::Exact(map) => map.get(&source).copied(),
            Self::Observed(_) => None,
        }
    }

    /// Observations recorded for `source` in observed mode.
    #[must_use]
    pub fn observations_of(&self, source: NodeId) -> Option<&[f64]> {
        match self {
            Self::Exact(_) => None,
            Self::Observed(map) => map.get(&source).map(Vec::as_slice),
        }
    }

    /// Merge an incoming snapshot.
    ///
    /// Returns true when a new source id was learned. A snapshot whose mode
    /// does not match the store is malformed and silently ignored.
    pub fn merge(&mut self, incoming: &Knowledge) -> bool {
        let mut learned = false;
        match (self, incoming) {
            (Self::Exact(store), Self::Exact(snapshot)) => {
                for (&source, &value) in snapshot {
                    // Write-once: a known source keeps its first value.
                    store.entry(source).or_insert_with(|| {
                        learned = true;
                        value
                    });
                }
            }
            (Self::Observed(store), Self::Observed(snapshot)) => {
                for (&source, observations) in snapshot {
                    if observations.is_empty() {
                        continue;
                    }
                    store
                        .entry(source)
                        .and_modify(|seq| seq.extend_from_slice(observations))
                        .or_insert_with(|| {
                            learned = true;
                            observations.clone()
                        });
                }
            }
            _ => {
                tracing::trace!("discarding knowledge snapshot with mismatched mode");
            }
        }
        learned
    }

    /// Average over the known sources.
    ///
    /// Exact mode is the plain mean. Observed mode takes each source's own
    /// mean first and averages those, weighting every source equally no
    /// matter how often it was observed.
    #[must_use]
    pub fn average(&self) -> f64 {
        match self {
            Self::Exact(map) => {
                if map.is_empty() {
                    return 0.0;
                }
                map.values().sum::<f64>() / map.len() as f64
            }
            Self::Observed(map) => {
                let means: Vec<f64> = map
                    .values()
                    .filter(|seq| !seq.is_empty())
                    .map(|seq| seq.iter().sum::<f64>() / seq.len() as f64)
                    .collect();
                if means.is_empty() {
                    return 0.0;
                }
                means.iter().sum::<f64>() / means.len() as f64
            }
        }
    }

    /// Compose the terminal report for this store.
    #[must_use]
    pub fn report(&self, from: NodeId) -> Report {
        Report {
            from,
            average: self.average(),
            known_sources: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_merge_is_write_once() {
        let mut store = Knowledge::new(ValueMode::Exact, NodeId(0), 1.0);
        let first = Knowledge::new(ValueMode::Exact, NodeId(1), 5.0);
        let second = Knowledge::new(ValueMode::Exact, NodeId(1), 9.0);

        assert!(store.merge(&first));
        assert!(!store.merge(&second));
        assert_eq!(store.value_of(NodeId(1)), Some(5.0));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn merging_own_snapshot_teaches_nothing() {
        let mut store = Knowledge::new(ValueMode::Exact, NodeId(0), 1.0);
        let snapshot = store.clone();
        assert!(!store.merge(&snapshot));
    }

    #[test]
    fn observed_merge_appends_repeats() {
        let mut store = Knowledge::new(ValueMode::Observed, NodeId(0), 1.0);
        let snapshot = Knowledge::new(ValueMode::Observed, NodeId(1), 4.0);

        assert!(store.merge(&snapshot));
        assert!(!store.merge(&snapshot), "repeat observation is not an update");
        assert_eq!(store.observations_of(NodeId(1)), Some(&[4.0, 4.0][..]));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn mode_mismatch_is_discarded() {
        let mut store = Knowledge::new(ValueMode::Exact, NodeId(0), 1.0);
        let noisy = Knowledge::new(ValueMode::Observed, NodeId(1), 4.0);
        assert!(!store.merge(&noisy));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn exact_average_is_plain_mean() {
        let mut store = Knowledge::new(ValueMode::Exact, NodeId(0), 0.0);
        for (id, value) in [(1u64, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)] {
            store.merge(&Knowledge::new(ValueMode::Exact, NodeId(id), value));
        }
        assert!((store.average() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn observed_average_weights_sources_equally() {
        let mut store = Knowledge::new(ValueMode::Observed, NodeId(0), 0.0);
        let near = Knowledge::new(ValueMode::Observed, NodeId(1), 10.0);
        // Source 1 observed five times, source 2 once.
        for _ in 0..5 {
            store.merge(&near);
        }
        store.merge(&Knowledge::new(ValueMode::Observed, NodeId(2), 4.0));

        // Per-source means: {0.0, 10.0, 4.0} -> 14/3, not skewed toward 10.
        assert!((store.average() - 14.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn report_carries_count_and_average() {
        let mut store = Knowledge::new(ValueMode::Exact, NodeId(0), 2.0);
        store.merge(&Knowledge::new(ValueMode::Exact, NodeId(1), 4.0));
        let report = store.report(NodeId(0));
        assert_eq!(report.from, NodeId(0));
        assert_eq!(report.known_sources, 2);
        assert!((report.average - 3.0).abs() < f64::EPSILON);
    }

    proptest! {
        // Write-once law: whatever arrives later, the first stored value for
        // a source never changes, and the store never shrinks.
        #[test]
        fn write_once_law(values in proptest::collection::vec((0u64..8, -1e6f64..1e6), 1..64)) {
            let mut store = Knowledge::new(ValueMode::Exact, NodeId(100), 0.0);
            let mut first_seen: std::collections::BTreeMap<u64, f64> = Default::default();
            let mut last_len = store.len();

            for (id, value) in values {
                store.merge(&Knowledge::new(ValueMode::Exact, NodeId(id), value));
                first_seen.entry(id).or_insert(value);
                prop_assert!(store.len() >= last_len);
                last_len = store.len();
            }
            for (id, value) in first_seen {
                prop_assert_eq!(store.value_of(NodeId(id)), Some(value));
            }
        }
    }
}
