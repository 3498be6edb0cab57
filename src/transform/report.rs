use serde::Serialize;
use tracing::info;

use crate::error::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageMetric {
    pub stage: &'static str,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl StageMetric {
    pub fn removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Row counts around each transform stage.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StageTracker {
    metrics: Vec<StageMetric>,
}

impl StageTracker {
    pub fn new() -> Self {
        StageTracker::default()
    }

    pub fn record(&mut self, stage: Stage, before: usize, after: usize) {
        info!(
            stage = stage.name(),
            rows = after,
            removed = before.saturating_sub(after),
            "stage done"
        );
        self.metrics.push(StageMetric {
            stage: stage.name(),
            rows_before: before,
            rows_after: after,
        });
    }

    pub fn metrics(&self) -> &[StageMetric] {
        &self.metrics
    }

    pub fn print(&self) {
        for m in self.metrics() {
            println!(
                "  {:<16} {:>6} -> {:>6} (removed {})",
                m.stage,
                m.rows_before,
                m.rows_after,
                m.removed()
            );
        }
    }
}
