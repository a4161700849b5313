//! Recurring-sale schedule evaluation.
//!
//! Sales that repeat carry a 5-field cron rule. This crate decides whether an
//! instant falls inside an occurrence of such a rule ([`window`]), describes
//! rules for the dashboard ([`label`]), and builds rules from the dashboard's
//! recurrence choices ([`builder`]).

pub mod builder;
pub mod error;
pub mod expression;
pub mod label;
pub mod occurrence;
pub mod weekday;
pub mod window;

pub use builder::{build_expression, option_label, RecurrenceType};
pub use error::ParseError;
pub use expression::{validate, CronField, FieldKind, RecurrenceExpression};
pub use label::{format_label, ParsedRecurrenceLabel, RecurrenceKind};
pub use occurrence::{CronerOccurrences, OccurrenceSource};
pub use weekday::{day_name, DAY_NAMES};
pub use window::{
    is_instant_in_recurrence_window, CampaignWindow, EvaluationQuery, RecurrenceWindowEvaluator,
    DEFAULT_ZONE, SCAN_STEP_MINUTES,
};
