//! # Batch Driver
//!
//! Produces one artifact per data row from a single template document.
//! Rows are bound with [`Bindings`], exported one after another through a
//! fresh orchestrator and surface each, and never abort their siblings: a
//! failing row is recorded and the job moves on.
//!
//! The job status summarizes the rows:
//!
//! | rows failed | status    |
//! |-------------|-----------|
//! | none        | `success` |
//! | some        | `partial` |
//! | all (> 0)   | `failed`  |

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::document::{Bindings, Document};
use crate::export::{Artifact, ExportEngine, ExportError, ExportOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Partial,
    Failed,
}

impl BatchStatus {
    /// Status of a job with `failed` failures out of `total` rows.
    pub fn from_counts(total: usize, failed: usize) -> Self {
        if failed == 0 {
            BatchStatus::Success
        } else if failed == total {
            BatchStatus::Failed
        } else {
            BatchStatus::Partial
        }
    }
}

/// Result of one row.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Success(Artifact),
    Failed(ExportError),
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Success(_))
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            RowOutcome::Success(artifact) => Some(artifact),
            RowOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ExportError> {
        match self {
            RowOutcome::Success(_) => None,
            RowOutcome::Failed(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: BatchStatus,
    /// One entry per input row, in input order.
    pub rows: Vec<RowOutcome>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.succeeded()
    }
}

/// Runs batch jobs on top of an [`ExportEngine`].
#[derive(Debug, Clone)]
pub struct BatchDriver {
    engine: ExportEngine,
}

impl BatchDriver {
    pub fn new(engine: ExportEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ExportEngine {
        &self.engine
    }

    /// Export `template` once per row. Unresolvable images fail their row.
    pub async fn run_batch(
        &self,
        template: &Document,
        rows: &[Bindings],
        options: ExportOptions,
    ) -> BatchResult {
        let job_id = Uuid::new_v4();
        let started_at = Utc::now();
        let options = options.strict();
        log::info!("batch {} started: {} rows as {}", job_id, rows.len(), options.format);

        let mut outcomes = Vec::with_capacity(rows.len());
        for (index, bindings) in rows.iter().enumerate() {
            let document = template.bind(bindings);
            let outcome = match self.engine.export_with(&document, options).await {
                Ok(artifact) => RowOutcome::Success(artifact),
                Err(e) => {
                    log::warn!("batch {} row {} failed: {}", job_id, index + 1, e);
                    RowOutcome::Failed(e)
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        let status = BatchStatus::from_counts(outcomes.len(), failed);
        log::info!(
            "batch {} finished: {:?} ({} of {} rows failed)",
            job_id,
            status,
            failed,
            outcomes.len()
        );
        BatchResult {
            job_id,
            started_at,
            finished_at: Utc::now(),
            status,
            rows: outcomes,
        }
    }
}
