use thiserror::Error;

use crate::expression::FieldKind;

/// Errors produced when a recurrence expression is parsed strictly.
///
/// The lenient evaluation and labelling entry points never surface these;
/// they collapse every variant into "not matching" / `不明`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("recurrence expression is empty")]
    Empty,

    #[error("expected 5 space-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field} field \"{raw}\": {reason}")]
    InvalidField {
        field: FieldKind,
        raw: String,
        reason: String,
    },

    #[error("unknown recurrence type \"{0}\"")]
    UnknownRecurrenceType(String),
}

impl ParseError {
    pub(crate) fn invalid(field: FieldKind, raw: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}
