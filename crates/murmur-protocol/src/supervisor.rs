//! Terminal report sink.

use std::sync::OnceLock;

use tracing::debug;

use crate::message::Report;

/// Accepts the first terminal report and exposes the final result.
///
/// The slot is write-once with first-writer-wins semantics: under concurrent
/// delivery exactly one report is accepted and every later submission is an
/// idempotent no-op.
#[derive(Debug, Default)]
pub struct Supervisor {
    accepted: OnceLock<Report>,
}

impl Supervisor {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a report. Returns true if this was the accepted one.
    pub fn submit(&self, report: Report) -> bool {
        let from = report.from;
        let accepted = self.accepted.set(report).is_ok();
        if accepted {
            debug!(%from, "accepted terminal report");
        } else {
            debug!(%from, "ignoring report, a result is already accepted");
        }
        accepted
    }

    /// The accepted report, if any node has converged yet.
    #[must_use]
    pub fn result(&self) -> Option<Report> {
        self.accepted.get().cloned()
    }
}
