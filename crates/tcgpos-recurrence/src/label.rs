//! Human-readable descriptions of recurrence expressions for the dashboard.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expression::{CronField, RecurrenceExpression};
use crate::weekday::{day_name, week_position};

const UNKNOWN: &str = "不明";
const NO_RECURRENCE: &str = "なし";

/// Which recurrence pattern an expression was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    None,
    Daily,
    Weekly,
    MonthlyByDate,
    MonthlyByWeek,
    Yearly,
    Weekday,
}

/// Structured label produced by [`format_label`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecurrenceLabel {
    /// e.g. `"毎日"`, `"2週ごと"`, `"3ヶ月ごと"`.
    pub frequency_text: String,
    pub recurrence_kind: RecurrenceKind,
    /// Weekday short names, present for weekly patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_names: Option<Vec<String>>,
    /// e.g. `"26日"`, `"第2火曜日"`, `"12月24日"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_text: Option<String>,
    /// The caller-supplied campaign end, unmodified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_text: Option<String>,
}

impl ParsedRecurrenceLabel {
    fn new(frequency_text: impl Into<String>, recurrence_kind: RecurrenceKind) -> Self {
        Self {
            frequency_text: frequency_text.into(),
            recurrence_kind,
            weekday_names: None,
            day_text: None,
            end_text: None,
        }
    }

    fn with_weekdays(mut self, names: Vec<String>) -> Self {
        self.weekday_names = Some(names);
        self
    }

    fn with_day(mut self, day_text: String) -> Self {
        self.day_text = Some(day_text);
        self
    }
}

/// Renders the single-line form used in sale listings, e.g.
/// `毎週（2024/12/01まで） 月、水、金`.
impl fmt::Display for ParsedRecurrenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frequency_text)?;
        if let Some(end) = &self.end_text {
            write!(f, "（{end}まで）")?;
        }
        if let Some(names) = self.weekday_names.as_ref().filter(|n| !n.is_empty()) {
            write!(f, " {}", names.join("、"))?;
        }
        if let Some(day) = &self.day_text {
            write!(f, " {day}")?;
        }
        Ok(())
    }
}

/// Describe `expression`, appending `end` verbatim when given.
///
/// Never fails: an empty expression yields `なし` and anything unparseable
/// yields `不明`, both with [`RecurrenceKind::None`].
#[must_use]
pub fn format_label(expression: &str, end: Option<&str>) -> ParsedRecurrenceLabel {
    let mut label = if expression.trim().is_empty() {
        ParsedRecurrenceLabel::new(NO_RECURRENCE, RecurrenceKind::None)
    } else {
        match expression.parse::<RecurrenceExpression>() {
            Ok(parsed) => classify(&parsed),
            Err(_) => ParsedRecurrenceLabel::new(UNKNOWN, RecurrenceKind::None),
        }
    };
    label.end_text = end.map(str::to_string);
    label
}

/// Classification in fixed priority order; the field patterns overlap, so
/// the first rule that fits wins.
fn classify(expr: &RecurrenceExpression) -> ParsedRecurrenceLabel {
    let day_of_month = expr.day_of_month();
    let month = expr.month();
    let day_of_week = expr.day_of_week();

    if day_of_month.is_any() && month.is_any() && day_of_week.is_any() {
        return ParsedRecurrenceLabel::new(every_n(1, "毎日", "日ごと"), RecurrenceKind::Daily);
    }

    if let Some(n) = day_of_month.step() {
        if month.is_any() && day_of_week.is_any() {
            return ParsedRecurrenceLabel::new(every_n(n, "毎日", "日ごと"), RecurrenceKind::Daily);
        }
    }

    match day_of_week {
        CronField::Range(from, to) => {
            let mut names: Vec<String> = Vec::new();
            for name in (*from..=*to).filter_map(day_name) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            let kind = if (*from, *to) == (1, 5) {
                RecurrenceKind::Weekday
            } else {
                RecurrenceKind::Weekly
            };
            return ParsedRecurrenceLabel::new("毎週", kind).with_weekdays(names);
        }
        CronField::Value(day) => {
            return weekly(expr, std::slice::from_ref(day));
        }
        CronField::List(days) => {
            return weekly(expr, days);
        }
        _ => {}
    }

    if let (CronField::Value(day), CronField::Value(m), CronField::Any) =
        (day_of_month, month, day_of_week)
    {
        return ParsedRecurrenceLabel::new("毎年", RecurrenceKind::Yearly)
            .with_day(format!("{m}月{day}日"));
    }

    let frequency = every_n(month.step().unwrap_or(1), "毎月", "ヶ月ごと");
    match day_of_week {
        CronField::NthWeekday { weekday, ordinal } => {
            let name = day_name(*weekday).unwrap_or(UNKNOWN);
            ParsedRecurrenceLabel::new(frequency, RecurrenceKind::MonthlyByWeek)
                .with_day(format!("第{ordinal}{name}曜日"))
        }
        _ => ParsedRecurrenceLabel::new(frequency, RecurrenceKind::MonthlyByDate)
            .with_day(format!("{day_of_month}日")),
    }
}

fn weekly(expr: &RecurrenceExpression, days: &[u32]) -> ParsedRecurrenceLabel {
    let mut names: Vec<&'static str> = days.iter().copied().filter_map(day_name).collect();
    names.sort_by_key(|name| week_position(name));
    names.dedup();

    ParsedRecurrenceLabel::new(every_n(week_step(expr), "毎週", "週ごと"), RecurrenceKind::Weekly)
        .with_weekdays(names.into_iter().map(str::to_string).collect())
}

/// Weeks between occurrences, taken from a `*/(7*k)` step in the
/// day-of-month, hour or minute field (first found); 1 otherwise.
fn week_step(expr: &RecurrenceExpression) -> u32 {
    [expr.day_of_month(), expr.hour(), expr.minute()]
        .into_iter()
        .find_map(|field| field.step().filter(|n| n % 7 == 0).map(|n| n / 7))
        .unwrap_or(1)
}

fn every_n(n: u32, single: &str, suffix: &str) -> String {
    if n <= 1 {
        single.to_string()
    } else {
        format!("{n}{suffix}")
    }
}

#[cfg(test)]
#[path = "label_test.rs"]
mod tests;
