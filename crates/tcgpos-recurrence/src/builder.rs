//! Builds the cron rule stored on a sale from the dashboard's recurrence
//! choice and the sale's start time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::expression::{CronField, RecurrenceExpression};
use crate::label::RecurrenceKind;
use crate::weekday::DAY_NAMES;

/// Recurrence choices offered when registering a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    MonthlyByDate,
    MonthlyByWeek,
    Yearly,
    Weekday,
}

impl RecurrenceType {
    pub const ALL: [RecurrenceType; 7] = [
        RecurrenceType::None,
        RecurrenceType::Daily,
        RecurrenceType::Weekly,
        RecurrenceType::MonthlyByDate,
        RecurrenceType::MonthlyByWeek,
        RecurrenceType::Yearly,
        RecurrenceType::Weekday,
    ];

    fn as_str(self) -> &'static str {
        match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::MonthlyByDate => "monthly_by_date",
            RecurrenceType::MonthlyByWeek => "monthly_by_week",
            RecurrenceType::Yearly => "yearly",
            RecurrenceType::Weekday => "weekday",
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecurrenceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseError::UnknownRecurrenceType(s.to_string()))
    }
}

/// Lets an edit form preselect the choice matching a stored rule.
impl From<RecurrenceKind> for RecurrenceType {
    fn from(kind: RecurrenceKind) -> Self {
        match kind {
            RecurrenceKind::None => RecurrenceType::None,
            RecurrenceKind::Daily => RecurrenceType::Daily,
            RecurrenceKind::Weekly => RecurrenceType::Weekly,
            RecurrenceKind::MonthlyByDate => RecurrenceType::MonthlyByDate,
            RecurrenceKind::MonthlyByWeek => RecurrenceType::MonthlyByWeek,
            RecurrenceKind::Yearly => RecurrenceType::Yearly,
            RecurrenceKind::Weekday => RecurrenceType::Weekday,
        }
    }
}

/// Calendar facts about a start instant in the operating zone.
struct StartParts {
    minute: u32,
    hour: u32,
    day: u32,
    month: u32,
    /// Sunday is 0, as in the day-name table.
    weekday: u32,
    week_of_month: u32,
}

impl StartParts {
    fn new(start: DateTime<Utc>, zone: Tz) -> Self {
        let local = start.with_timezone(&zone);
        Self {
            minute: local.minute(),
            hour: local.hour(),
            day: local.day(),
            month: local.month(),
            weekday: local.weekday().num_days_from_sunday(),
            week_of_month: local.day().div_ceil(7),
        }
    }

    /// Weekday as written into rules; Sunday is stored as 7.
    fn cron_weekday(&self) -> u32 {
        if self.weekday == 0 {
            7
        } else {
            self.weekday
        }
    }

    fn weekday_name(&self) -> &'static str {
        DAY_NAMES[self.weekday as usize]
    }
}

/// Build the rule for `recurrence` anchored at `start`.
///
/// Minute and hour always come from `start` in `zone`. Returns `None` for
/// [`RecurrenceType::None`].
#[must_use]
pub fn build_expression(
    recurrence: RecurrenceType,
    start: DateTime<Utc>,
    zone: Tz,
) -> Option<RecurrenceExpression> {
    let parts = StartParts::new(start, zone);
    let at = |day_of_month: CronField, month: CronField, day_of_week: CronField| {
        RecurrenceExpression::new(
            CronField::Value(parts.minute),
            CronField::Value(parts.hour),
            day_of_month,
            month,
            day_of_week,
        )
    };

    let expression = match recurrence {
        RecurrenceType::None => return None,
        RecurrenceType::Daily => at(CronField::Any, CronField::Any, CronField::Any),
        RecurrenceType::Weekly => at(
            CronField::Any,
            CronField::Any,
            CronField::Value(parts.cron_weekday()),
        ),
        RecurrenceType::MonthlyByDate => {
            at(CronField::Value(parts.day), CronField::Any, CronField::Any)
        }
        RecurrenceType::MonthlyByWeek => at(
            CronField::Any,
            CronField::Any,
            CronField::NthWeekday {
                weekday: parts.cron_weekday(),
                ordinal: parts.week_of_month,
            },
        ),
        RecurrenceType::Yearly => at(
            CronField::Value(parts.day),
            CronField::Value(parts.month),
            CronField::Any,
        ),
        RecurrenceType::Weekday => at(CronField::Any, CronField::Any, CronField::Range(1, 5)),
    };
    Some(expression)
}

/// Dropdown text for `recurrence` given the sale's start, e.g. `毎月第2火曜日`.
#[must_use]
pub fn option_label(recurrence: RecurrenceType, start: DateTime<Utc>, zone: Tz) -> String {
    let parts = StartParts::new(start, zone);
    let weekday = parts.weekday_name();
    match recurrence {
        RecurrenceType::None => "繰り返さない".to_string(),
        RecurrenceType::Daily => "毎日".to_string(),
        RecurrenceType::Weekly => format!("毎週{weekday}曜日"),
        RecurrenceType::MonthlyByDate => format!("毎月{}日", parts.day),
        RecurrenceType::MonthlyByWeek => format!("毎月第{}{weekday}曜日", parts.week_of_month),
        RecurrenceType::Yearly => format!("毎年{}月{}日", parts.month, parts.day),
        RecurrenceType::Weekday => "毎週平日（月〜金）".to_string(),
    }
}
