// src/orchestrator.rs
use metrics::{counter, gauge};

use crate::category::Category;
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, StorageError};
use crate::ledger::Ledger;

/// Outcome of one run across all categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `(category id, delivered)` in dispatch order.
    pub delivered: Vec<(String, usize)>,
    /// Categories whose dispatch stopped on a channel problem.
    pub failed: Vec<String>,
}

impl RunReport {
    pub fn total_delivered(&self) -> usize {
        self.delivered.iter().map(|(_, n)| n).sum()
    }

    pub fn delivered_for(&self, category: &str) -> Option<usize> {
        self.delivered
            .iter()
            .find(|(id, _)| id == category)
            .map(|(_, n)| *n)
    }
}

/// Owns the category list and the ledger for the lifetime of the process.
pub struct Orchestrator {
    categories: Vec<Category>,
    dispatcher: Dispatcher,
    ledger: Ledger,
}

impl Orchestrator {
    pub fn new(categories: Vec<Category>, dispatcher: Dispatcher, ledger: Ledger) -> Self {
        Self {
            categories,
            dispatcher,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Dispatch every category once, sequentially, in configured order.
    ///
    /// Channel failures are contained per category. A storage failure ends
    /// the run: the ledger can no longer be persisted, and continuing would
    /// risk re-delivering after a restart.
    pub async fn run_all(&mut self) -> Result<RunReport, StorageError> {
        tracing::info!(categories = self.categories.len(), "checking for new items");
        counter!("relay_runs_total").increment(1);

        let mut report = RunReport::default();
        for category in &self.categories {
            match self.dispatcher.dispatch(category, &mut self.ledger).await {
                Ok(n) => report.delivered.push((category.id.clone(), n)),
                Err(DispatchError::Storage(e)) => {
                    tracing::error!(error = %e, category = %category.id, "ledger write failed, run aborted");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, category = %category.id, "category skipped");
                    report.failed.push(category.id.clone());
                }
            }
        }

        gauge!("relay_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            delivered = report.total_delivered(),
            failed = report.failed.len(),
            ledger = self.ledger.len(),
            "run finished"
        );
        Ok(report)
    }
}
