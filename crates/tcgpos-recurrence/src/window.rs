//! Campaign-window evaluation for recurring sales.
//!
//! A recurring sale stores a cron rule, the start and end of its first
//! occurrence, and is "on" whenever the current instant lies within one
//! occurrence length after any tick of the rule. Day-of-month and month steps
//! (`*/n`) count from the campaign's own start rather than from the calendar.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::expression::{CronField, RecurrenceExpression};
use crate::occurrence::{CronerOccurrences, OccurrenceSource};

/// Operating zone used when none is configured.
pub const DEFAULT_ZONE: Tz = chrono_tz::Asia::Tokyo;

/// Distance between consecutive steps of the backward scan.
pub const SCAN_STEP_MINUTES: i64 = 10;

/// Nudge applied before asking the cron primitive for the next tick so that an
/// instant sitting exactly on a tick reports itself.
const TICK_NUDGE_SECS: i64 = 1;

/// `[start_date, end_date?]` of a recurring campaign's first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CampaignWindow {
    #[must_use]
    pub fn new(start_date: DateTime<Utc>, end_date: Option<DateTime<Utc>>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Length of the backward scan, or `None` for an unbounded window.
    #[must_use]
    pub fn span(&self) -> Option<TimeDelta> {
        self.end_date.map(|end| end - self.start_date)
    }
}

/// Everything one evaluation needs. Built per call and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationQuery {
    pub expression: String,
    pub candidate_instant: DateTime<Utc>,
    pub window: CampaignWindow,
}

/// Decides whether an instant falls on an active occurrence of a recurrence.
#[derive(Debug, Clone)]
pub struct RecurrenceWindowEvaluator<S = CronerOccurrences> {
    source: S,
    zone: Tz,
}

impl RecurrenceWindowEvaluator {
    /// Evaluator backed by `croner`, anchored to `zone`.
    #[must_use]
    pub fn new(zone: Tz) -> Self {
        Self::with_source(CronerOccurrences, zone)
    }
}

impl Default for RecurrenceWindowEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE)
    }
}

impl<S: OccurrenceSource> RecurrenceWindowEvaluator<S> {
    #[must_use]
    pub fn with_source(source: S, zone: Tz) -> Self {
        Self { source, zone }
    }

    #[must_use]
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Lenient check used for sale gating: every invalid input is `false`.
    ///
    /// An empty or unparseable expression never matches. Otherwise a candidate
    /// before the window start never matches, an unbounded window always
    /// matches, and a bounded window is searched backward from the candidate
    /// in 10-minute steps for at most its own length.
    #[must_use]
    pub fn is_instant_in_window(
        &self,
        expression: &str,
        candidate: DateTime<Utc>,
        window: &CampaignWindow,
    ) -> bool {
        if expression.trim().is_empty() {
            return false;
        }
        match expression.parse::<RecurrenceExpression>() {
            Ok(parsed) => self.scan(&parsed, candidate, window),
            Err(e) => {
                tracing::debug!(expression, error = %e, "recurrence: unparseable expression treated as not matching");
                false
            }
        }
    }

    /// Strict variant of [`Self::is_instant_in_window`].
    ///
    /// An empty expression is `Ok(false)`; every other outcome matches the
    /// lenient check.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the expression is non-empty and malformed.
    pub fn check(&self, query: &EvaluationQuery) -> Result<bool, ParseError> {
        if query.expression.trim().is_empty() {
            return Ok(false);
        }
        let parsed: RecurrenceExpression = query.expression.parse()?;
        Ok(self.scan(&parsed, query.candidate_instant, &query.window))
    }

    fn scan(
        &self,
        expression: &RecurrenceExpression,
        candidate: DateTime<Utc>,
        window: &CampaignWindow,
    ) -> bool {
        if candidate < window.start_date {
            return false;
        }

        // Open-ended campaigns are treated as always on once started.
        let Some(span) = window.span() else {
            return true;
        };

        let step = TimeDelta::minutes(SCAN_STEP_MINUTES);
        let mut offset = TimeDelta::zero();
        while offset <= span {
            if self.is_tick_at(candidate - offset, window.start_date, expression) {
                return true;
            }
            offset = offset + step;
        }
        false
    }

    /// Whether `target` is exactly a tick of `expression`, with day-of-month
    /// and month steps counted from `campaign_start`.
    #[must_use]
    pub fn is_tick_at(
        &self,
        target: DateTime<Utc>,
        campaign_start: DateTime<Utc>,
        expression: &RecurrenceExpression,
    ) -> bool {
        let Some(calendar) = self.campaign_relative(expression, target, campaign_start) else {
            return false;
        };

        let search_from = target - TimeDelta::seconds(TICK_NUDGE_SECS);
        self.source
            .next_occurrence(&calendar, self.zone, search_from)
            .is_some_and(|next| next.timestamp_millis() == target.timestamp_millis())
    }

    /// Resolve campaign-relative steps for `target`.
    ///
    /// Returns `None` when `target` falls on an off-step month or day;
    /// otherwise a copy of `expression` with each satisfied step rewritten to
    /// `*`, ready for a calendar cron evaluator.
    #[must_use]
    pub fn campaign_relative(
        &self,
        expression: &RecurrenceExpression,
        target: DateTime<Utc>,
        campaign_start: DateTime<Utc>,
    ) -> Option<RecurrenceExpression> {
        let start = campaign_start.with_timezone(&self.zone);
        let target = target.with_timezone(&self.zone);
        let mut calendar = expression.clone();

        if let Some(n) = expression.month().step() {
            let elapsed = month_index(&target) - month_index(&start);
            if elapsed % i64::from(n) != 0 {
                return None;
            }
            calendar = calendar.with_month(CronField::Any);
        }

        if let Some(n) = expression.day_of_month().step() {
            let elapsed = (target.date_naive() - start.date_naive()).num_days();
            if elapsed % i64::from(n) != 0 {
                return None;
            }
            calendar = calendar.with_day_of_month(CronField::Any);
        }

        Some(calendar)
    }
}

fn month_index<D: Datelike>(date: &D) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// [`RecurrenceWindowEvaluator::is_instant_in_window`] with the default
/// `croner` source and [`DEFAULT_ZONE`].
#[must_use]
pub fn is_instant_in_recurrence_window(
    expression: &str,
    candidate: DateTime<Utc>,
    window: &CampaignWindow,
) -> bool {
    RecurrenceWindowEvaluator::default().is_instant_in_window(expression, candidate, window)
}

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;
