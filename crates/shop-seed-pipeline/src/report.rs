use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::assets::DownloadSummary;
use crate::rewrite::RewriteSummary;
use crate::stages::Stage;

/// Counters shared by the concurrent record creations of one stage.
#[derive(Debug, Default)]
pub struct StageTally {
    created: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl StageTally {
    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn finish(&self, stage: Stage) -> StageReport {
        StageReport {
            stage,
            created: self.created.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub created: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    pub downloads: DownloadSummary,
    pub blueprint_file: Option<String>,
    pub rewrite: Option<RewriteSummary>,
    pub coding_challenges: usize,
}

impl RunReport {
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.stages.iter().map(|report| report.failed).sum()
    }

    #[must_use]
    pub fn total_created(&self) -> usize {
        self.stages.iter().map(|report| report.created).sum()
    }
}
