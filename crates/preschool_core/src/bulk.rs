//! Sequential bulk jobs with "continue on error, collect errors" semantics.
//!
//! Items run strictly one after another. Before each item the job's
//! precondition (for example re-checking the acting admin's session) runs;
//! if it fails the rest of the batch is abandoned. An item failure is
//! recorded and the loop moves on, so partial success is a normal outcome.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub index: usize,
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<BulkFailure>,
    /// Set when the precondition failed and the remaining items were skipped.
    pub aborted: Option<String>,
    pub skipped: usize,
}

impl<T> BulkReport<T> {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

#[async_trait]
pub trait BulkStep: Send + Sync {
    type Item: Send;
    type Output: Send;

    /// Short description of an item for error reports.
    fn label(&self, item: &Self::Item) -> String;

    /// Runs before every item; an error aborts the remaining batch.
    async fn precondition(&self) -> Result<(), String> {
        Ok(())
    }

    async fn apply(&self, item: Self::Item) -> Result<Self::Output, String>;
}

pub async fn run_bulk<S: BulkStep>(step: &S, items: Vec<S::Item>) -> BulkReport<S::Output> {
    let total = items.len();
    let mut report = BulkReport {
        succeeded: Vec::new(),
        failures: Vec::new(),
        aborted: None,
        skipped: 0,
    };

    for (index, item) in items.into_iter().enumerate() {
        if let Err(reason) = step.precondition().await {
            warn!(index, %reason, "bulk job aborted");
            report.skipped = total - index;
            report.aborted = Some(reason);
            break;
        }
        let label = step.label(&item);
        match step.apply(item).await {
            Ok(output) => report.succeeded.push(output),
            Err(reason) => {
                warn!(index, %label, %reason, "bulk item failed");
                report.failures.push(BulkFailure {
                    index,
                    label,
                    reason,
                });
            }
        }
    }

    info!(
        total,
        succeeded = report.succeeded.len(),
        failed = report.failures.len(),
        skipped = report.skipped,
        "bulk job finished"
    );
    report
}
