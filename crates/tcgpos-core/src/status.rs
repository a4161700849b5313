//! Periodic status sweep for sales.
//!
//! Each sweep looks at every unfinished sale that has started and decides,
//! in order, whether it should be running, whether a recurring sale should go
//! back to waiting for its next occurrence, and whether the sale is over.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tcgpos_recurrence::{OccurrenceSource, RecurrenceWindowEvaluator};

use crate::sales::{Sale, SaleStatus};

/// Grid the sweep runs on, in minutes.
const SWEEP_GRID_MINUTES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    pub sale_id: i64,
    pub from: SaleStatus,
    pub to: SaleStatus,
    /// Set when the sale's sold-item history was reset for a new occurrence.
    pub history_cleared: bool,
}

/// Truncate `now` to the start of its 10-minute slot in `zone`.
#[must_use]
pub fn floor_to_ten_minutes(now: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&zone);
    let past_slot = (local.minute() % SWEEP_GRID_MINUTES) * 60 + local.second();
    now - TimeDelta::seconds(i64::from(past_slot))
        - TimeDelta::nanoseconds(i64::from(local.nanosecond()))
}

/// Work out the status changes a sweep at `now` would make.
///
/// `now` is floored to the sweep grid in the evaluator's zone first. Sales
/// that are finished or have not started yet are skipped.
pub fn plan_status_updates<S: OccurrenceSource>(
    sales: &[Sale],
    now: DateTime<Utc>,
    evaluator: &RecurrenceWindowEvaluator<S>,
) -> Vec<StatusTransition> {
    let now = floor_to_ten_minutes(now, evaluator.zone());
    let candidates = sales
        .iter()
        .filter(|sale| sale.status != SaleStatus::Finished && sale.start_datetime <= now);

    let transitions: Vec<StatusTransition> = candidates
        .filter_map(|sale| plan_sale(sale, now, evaluator))
        .collect();

    tracing::debug!(
        now = %now,
        sales = sales.len(),
        transitions = transitions.len(),
        "status: sweep planned"
    );
    transitions
}

fn plan_sale<S: OccurrenceSource>(
    sale: &Sale,
    now: DateTime<Utc>,
    evaluator: &RecurrenceWindowEvaluator<S>,
) -> Option<StatusTransition> {
    let repeating = sale.is_repeating();
    let in_window = evaluator.is_instant_in_window(sale.repeat_rule(), now, &sale.window());
    let limit_reached = sale.is_item_limit_reached();

    let mut status = sale.status;
    let mut history_cleared = false;

    let started = !repeating && now >= sale.start_datetime;
    if (started || in_window) && status != SaleStatus::OnHeld {
        status = SaleStatus::OnHeld;
    }

    if repeating && status != SaleStatus::NotHeld && (!in_window || limit_reached) {
        status = SaleStatus::NotHeld;
        history_cleared = true;
    }

    let sale_over = sale.sale_end_datetime.is_some_and(|end| now >= end);
    if sale_over || (!repeating && limit_reached) {
        status = SaleStatus::Finished;
    }

    if status == sale.status && !history_cleared {
        return None;
    }

    tracing::info!(
        sale_id = sale.id,
        from = %sale.status,
        to = %status,
        history_cleared,
        "status: sale transition"
    );
    Some(StatusTransition {
        sale_id: sale.id,
        from: sale.status,
        to: status,
        history_cleared,
    })
}

/// Apply a planned transition to its sale.
pub fn apply_transition(sale: &mut Sale, transition: &StatusTransition) {
    sale.status = transition.to;
    if transition.history_cleared {
        sale.product_history.clear();
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
