//! Per-cycle accounting.
//!
//! A cycle is complete once every (dimension, customer) pair was attempted;
//! the report separates attempts from successes so partial failure stays
//! visible without failing the cycle.

use serde::{Deserialize, Serialize};

use munger_core::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    NotFound,
    Transport,
    Malformed,
    Publish,
    Config,
}

impl SkipKind {
    /// Classify a fetch/decode failure.
    pub fn from_fetch_error(err: &Error) -> Self {
        match err {
            Error::NotFound(_) => SkipKind::NotFound,
            Error::Transport(_) => SkipKind::Transport,
            Error::MalformedPayload { .. } => SkipKind::Malformed,
            Error::Config(_) => SkipKind::Config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub customer: String,
    pub suffix: String,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleReport {
    /// 1-based sequence number within this process.
    pub cycle: u64,
    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
    pub customers: usize,
    pub dimensions: usize,
    pub attempted: usize,
    pub published: usize,
    pub skipped: Vec<SkippedItem>,
    pub cancelled: bool,
}

impl CycleReport {
    pub fn new(cycle: u64, started_ms: u64, customers: usize, dimensions: usize) -> Self {
        Self {
            cycle,
            started_ms,
            finished_ms: started_ms,
            customers,
            dimensions,
            ..Default::default()
        }
    }

    pub fn record_published(&mut self) {
        self.attempted += 1;
        self.published += 1;
    }

    pub fn record_skipped(&mut self, item: SkippedItem) {
        self.attempted += 1;
        self.skipped.push(item);
    }

    pub fn finish(&mut self, finished_ms: u64) {
        self.finished_ms = finished_ms;
    }

    /// Pairs the full catalog × customer grid would attempt.
    pub fn expected(&self) -> usize {
        self.customers * self.dimensions
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }

    pub fn skipped_count(&self, kind: SkipKind) -> usize {
        self.skipped.iter().filter(|s| s.kind == kind).count()
    }

    pub fn emit_summary(&self) {
        tracing::info!(
            cycle = self.cycle,
            customers = self.customers,
            dimensions = self.dimensions,
            attempted = self.attempted,
            published = self.published,
            skipped = self.skipped.len(),
            cancelled = self.cancelled,
            duration_ms = self.duration_ms(),
            "cycle finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_attempts_and_successes_separately() {
        let mut r = CycleReport::new(1, 100, 2, 1);
        r.record_published();
        r.record_skipped(SkippedItem {
            customer: "2000".into(),
            suffix: "1".into(),
            kind: SkipKind::NotFound,
            reason: "missing".into(),
        });
        r.finish(150);
        assert_eq!(r.attempted, r.expected());
        assert_eq!(r.published, 1);
        assert_eq!(r.skipped_count(SkipKind::NotFound), 1);
        assert_eq!(r.duration_ms(), 50);
    }

    #[test]
    fn classifies_fetch_errors() {
        assert_eq!(
            SkipKind::from_fetch_error(&Error::malformed("k", "bad")),
            SkipKind::Malformed
        );
        assert_eq!(
            SkipKind::from_fetch_error(&Error::Transport("down".into())),
            SkipKind::Transport
        );
    }
}
