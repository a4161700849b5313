//! In-memory board of sales shared by the API and the status sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tcgpos_core::{
    apply_transition, floor_to_ten_minutes, plan_status_updates, Sale, SaleStatus,
    SoldCountOverflow, StatusTransition,
};
use tcgpos_recurrence::RecurrenceWindowEvaluator;
use tokio::{sync::RwLock, task::JoinError};

#[derive(Debug, Clone, Default)]
pub struct SaleBoard {
    sales: Arc<RwLock<Vec<Sale>>>,
}

/// Outcome of one status sweep.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SweepReport {
    /// Sweep instant after flooring to the 10-minute grid.
    pub at: DateTime<Utc>,
    pub transitions: Vec<StatusTransition>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SoldError {
    NotFound,
    NotRunning,
    CountOverflow(SoldCountOverflow),
}

impl SaleBoard {
    #[must_use]
    pub fn new(sales: Vec<Sale>) -> Self {
        Self {
            sales: Arc::new(RwLock::new(sales)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sales.read().await.len()
    }

    pub async fn list(&self) -> Vec<Sale> {
        self.sales.read().await.clone()
    }

    pub async fn get(&self, id: i64) -> Option<Sale> {
        self.sales.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Record units sold under a running sale and return the updated sale.
    pub async fn record_sold(
        &self,
        id: i64,
        product_id: i64,
        item_count: i64,
    ) -> Result<Sale, SoldError> {
        let mut sales = self.sales.write().await;
        let sale = sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SoldError::NotFound)?;
        if sale.status != SaleStatus::OnHeld {
            return Err(SoldError::NotRunning);
        }
        sale.record_sold(product_id, item_count)
            .map_err(SoldError::CountOverflow)?;
        Ok(sale.clone())
    }

    /// Plan and apply status transitions for a sweep at `now`.
    ///
    /// Planning runs on a snapshot in the blocking pool so readers are not
    /// held up by the window scans. A transition is applied only if its sale
    /// still has the status it was planned from.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError`] if the planning task panicked or was cancelled;
    /// the board is left unchanged.
    pub async fn sweep(
        &self,
        now: DateTime<Utc>,
        evaluator: &RecurrenceWindowEvaluator,
    ) -> Result<SweepReport, JoinError> {
        let snapshot = self.sales.read().await.clone();
        let planner = evaluator.clone();
        let planned = tokio::task::spawn_blocking(move || {
            plan_status_updates(&snapshot, now, &planner)
        })
        .await?;

        let mut sales = self.sales.write().await;
        let mut transitions = Vec::with_capacity(planned.len());
        for transition in planned {
            let Some(sale) = sales
                .iter_mut()
                .find(|s| s.id == transition.sale_id && s.status == transition.from)
            else {
                tracing::debug!(
                    sale_id = transition.sale_id,
                    "sale changed while planning; transition skipped"
                );
                continue;
            };
            apply_transition(sale, &transition);
            transitions.push(transition);
        }

        Ok(SweepReport {
            at: floor_to_ten_minutes(now, evaluator.zone()),
            transitions,
        })
    }
}
