//! The cron "next occurrence" primitive the window evaluator delegates to.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;

use crate::expression::RecurrenceExpression;

/// Answers "when does `expression` next fire at or after `after`?" in `zone`.
///
/// Returns `None` when the expression cannot be evaluated or has no
/// occurrence within the implementation's search horizon.
pub trait OccurrenceSource {
    fn next_occurrence(
        &self,
        expression: &RecurrenceExpression,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Option<DateTime<Utc>>;
}

impl<S: OccurrenceSource + ?Sized> OccurrenceSource for &S {
    fn next_occurrence(
        &self,
        expression: &RecurrenceExpression,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        (**self).next_occurrence(expression, zone, after)
    }
}

/// [`OccurrenceSource`] backed by the `croner` crate.
///
/// The schedule is parsed on every call; nothing is cached between queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronerOccurrences;

impl OccurrenceSource for CronerOccurrences {
    fn next_occurrence(
        &self,
        expression: &RecurrenceExpression,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let text = expression.to_string();
        let cron = match Cron::from_str(&text) {
            Ok(cron) => cron,
            Err(e) => {
                tracing::debug!(expression = %text, error = %e, "cron primitive rejected expression");
                return None;
            }
        };

        match cron.find_next_occurrence(&after.with_timezone(&zone), true) {
            Ok(next) => Some(next.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(expression = %text, error = %e, "no next occurrence");
                None
            }
        }
    }
}
