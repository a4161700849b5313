//! Typed 5-field recurrence expressions.
//!
//! Only the subset of cron syntax the sale scheduler writes is accepted:
//! `*`, a literal, a comma list, an `a-b` range, a `*/n` step, and the
//! ordinal-weekday marker `w#k` in the day-of-week field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Which of the five cron positions a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl FieldKind {
    /// Inclusive bounds for literal values in this position.
    #[must_use]
    pub fn bounds(self) -> (u32, u32) {
        match self {
            FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::DayOfMonth => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::DayOfWeek => (0, 7),
        }
    }

    /// Day-of-month and month steps are campaign-relative and are never handed
    /// to the cron primitive, so their step size is not capped.
    fn caps_step(self) -> bool {
        !matches!(self, FieldKind::DayOfMonth | FieldKind::Month)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Minute => write!(f, "minute"),
            FieldKind::Hour => write!(f, "hour"),
            FieldKind::DayOfMonth => write!(f, "day-of-month"),
            FieldKind::Month => write!(f, "month"),
            FieldKind::DayOfWeek => write!(f, "day-of-week"),
        }
    }
}

/// One parsed cron field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
    /// `*`
    Any,
    /// `n`
    Value(u32),
    /// `a,b,c`
    List(Vec<u32>),
    /// `a-b`, inclusive.
    Range(u32, u32),
    /// `*/n`
    Step(u32),
    /// `w#k`: the k-th weekday `w` of the month. Day-of-week only.
    NthWeekday { weekday: u32, ordinal: u32 },
}

impl CronField {
    /// Parse a single field for the given position.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidField`] when the text is outside the
    /// accepted syntax or a value is out of range for `kind`.
    pub fn parse(kind: FieldKind, raw: &str) -> Result<Self, ParseError> {
        if raw == "*" {
            return Ok(CronField::Any);
        }

        if let Some(step) = raw.strip_prefix("*/") {
            let n = parse_number(kind, raw, step)?;
            if n == 0 {
                return Err(ParseError::invalid(kind, raw, "step must be at least 1"));
            }
            if kind.caps_step() && n > kind.bounds().1 {
                return Err(ParseError::invalid(kind, raw, "step exceeds field range"));
            }
            return Ok(CronField::Step(n));
        }

        if let Some((weekday, ordinal)) = raw.split_once('#') {
            if kind != FieldKind::DayOfWeek {
                return Err(ParseError::invalid(
                    kind,
                    raw,
                    "ordinal weekday marker is only valid in day-of-week",
                ));
            }
            let weekday = parse_bounded(kind, raw, weekday)?;
            let ordinal = parse_number(kind, raw, ordinal)?;
            if !(1..=5).contains(&ordinal) {
                return Err(ParseError::invalid(kind, raw, "ordinal week must be 1-5"));
            }
            return Ok(CronField::NthWeekday { weekday, ordinal });
        }

        if raw.contains(',') {
            let values = raw
                .split(',')
                .map(|part| parse_bounded(kind, raw, part))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(CronField::List(values));
        }

        if let Some((start, end)) = raw.split_once('-') {
            let start = parse_bounded(kind, raw, start)?;
            let end = parse_bounded(kind, raw, end)?;
            if start > end {
                return Err(ParseError::invalid(kind, raw, "range start is after range end"));
            }
            return Ok(CronField::Range(start, end));
        }

        parse_bounded(kind, raw, raw).map(CronField::Value)
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, CronField::Any)
    }

    /// The concrete values a literal, list or range names. `None` for the
    /// open forms.
    fn listed(&self) -> Option<Box<dyn Iterator<Item = u32> + '_>> {
        match self {
            CronField::Value(v) => Some(Box::new(std::iter::once(*v))),
            CronField::List(values) => Some(Box::new(values.iter().copied())),
            CronField::Range(start, end) => Some(Box::new(*start..=*end)),
            _ => None,
        }
    }

    /// The `n` of a `*/n` step, if this field is one.
    #[must_use]
    pub fn step(&self) -> Option<u32> {
        match self {
            CronField::Step(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CronField::Any => write!(f, "*"),
            CronField::Value(v) => write!(f, "{v}"),
            CronField::List(values) => {
                let joined = values
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{joined}")
            }
            CronField::Range(a, b) => write!(f, "{a}-{b}"),
            CronField::Step(n) => write!(f, "*/{n}"),
            CronField::NthWeekday { weekday, ordinal } => write!(f, "{weekday}#{ordinal}"),
        }
    }
}

fn parse_number(kind: FieldKind, raw: &str, digits: &str) -> Result<u32, ParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::invalid(kind, raw, format!("\"{digits}\" is not a number")));
    }
    digits
        .parse::<u32>()
        .map_err(|e| ParseError::invalid(kind, raw, e.to_string()))
}

fn parse_bounded(kind: FieldKind, raw: &str, digits: &str) -> Result<u32, ParseError> {
    let value = parse_number(kind, raw, digits)?;
    let (min, max) = kind.bounds();
    if value < min || value > max {
        return Err(ParseError::invalid(
            kind,
            raw,
            format!("{value} is outside {min}-{max}"),
        ));
    }
    Ok(value)
}

/// An immutable 5-field recurrence expression
/// (`minute hour day-of-month month day-of-week`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceExpression {
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
}

impl RecurrenceExpression {
    #[must_use]
    pub fn new(
        minute: CronField,
        hour: CronField,
        day_of_month: CronField,
        month: CronField,
        day_of_week: CronField,
    ) -> Self {
        Self {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        }
    }

    #[must_use]
    pub fn minute(&self) -> &CronField {
        &self.minute
    }

    #[must_use]
    pub fn hour(&self) -> &CronField {
        &self.hour
    }

    #[must_use]
    pub fn day_of_month(&self) -> &CronField {
        &self.day_of_month
    }

    #[must_use]
    pub fn month(&self) -> &CronField {
        &self.month
    }

    #[must_use]
    pub fn day_of_week(&self) -> &CronField {
        &self.day_of_week
    }

    /// Copy of this expression with the day-of-month field replaced.
    #[must_use]
    pub fn with_day_of_month(&self, field: CronField) -> Self {
        Self {
            day_of_month: field,
            ..self.clone()
        }
    }

    /// Copy of this expression with the month field replaced.
    #[must_use]
    pub fn with_month(&self, field: CronField) -> Self {
        Self {
            month: field,
            ..self.clone()
        }
    }
}

impl FromStr for RecurrenceExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = parts.as_slice() else {
            return Err(ParseError::FieldCount(parts.len()));
        };

        let expr = Self {
            minute: CronField::parse(FieldKind::Minute, minute)?,
            hour: CronField::parse(FieldKind::Hour, hour)?,
            day_of_month: CronField::parse(FieldKind::DayOfMonth, day_of_month)?,
            month: CronField::parse(FieldKind::Month, month)?,
            day_of_week: CronField::parse(FieldKind::DayOfWeek, day_of_week)?,
        };
        ensure_day_exists(&expr, day_of_month)?;
        Ok(expr)
    }
}

/// Longest length of each month, leap years included.
const MONTH_MAX_DAYS: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Reject rules whose day of month falls past the end of every listed month.
///
/// A restricted day-of-week is OR-ed with the day of month by the cron
/// primitive, so such rules can still fire and are left alone.
fn ensure_day_exists(expr: &RecurrenceExpression, raw_day: &str) -> Result<(), ParseError> {
    if !expr.day_of_week.is_any() {
        return Ok(());
    }
    let Some(earliest_day) = expr.day_of_month.listed().and_then(|days| days.min()) else {
        return Ok(());
    };
    let longest_month = match expr.month.listed() {
        Some(months) => months
            .filter_map(|m| MONTH_MAX_DAYS.get(m as usize - 1).copied())
            .max()
            .unwrap_or(31),
        None => 31,
    };
    if earliest_day > longest_month {
        return Err(ParseError::invalid(
            FieldKind::DayOfMonth,
            raw_day,
            format!("day {earliest_day} never occurs in the listed months"),
        ));
    }
    Ok(())
}

impl fmt::Display for RecurrenceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

/// Check an expression without evaluating it.
///
/// # Errors
///
/// Returns the [`ParseError`] describing the first offending field.
pub fn validate(expression: &str) -> Result<RecurrenceExpression, ParseError> {
    expression.parse()
}
