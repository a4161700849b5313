//! Recurrence rule command handlers for the CLI.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Subcommand;
use tcgpos_recurrence::{
    build_expression, format_label, option_label, validate, CampaignWindow, EvaluationQuery,
    RecurrenceType, RecurrenceWindowEvaluator,
};

/// Sub-commands available under `recurrence`.
#[derive(Debug, Subcommand)]
pub enum RecurrenceCommands {
    /// Check whether an instant falls inside an occurrence of a rule
    Check {
        /// 5-field cron rule, e.g. "0 10 * * 1-5"
        expression: String,
        /// Instant to test (RFC 3339)
        #[arg(long)]
        at: DateTime<Utc>,
        /// Campaign start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,
        /// End of the first occurrence (RFC 3339); omit for an unbounded window
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// Describe a rule the way the sale list shows it
    Label {
        expression: String,
        /// Campaign end text appended to the frequency
        #[arg(long)]
        end: Option<String>,
        /// Print the structured label as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the rule for a recurrence choice anchored at a start instant
    Build {
        /// none, daily, weekly, monthly_by_date, monthly_by_week, yearly, weekday
        #[arg(long = "type")]
        recurrence_type: RecurrenceType,
        /// Sale start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,
    },
    /// Validate a rule and print its canonical form
    Validate { expression: String },
}

/// Run a `recurrence` sub-command, computing calendar fields in `zone`.
///
/// # Errors
///
/// Returns an error if the rule does not parse.
pub(crate) fn run_recurrence(command: RecurrenceCommands, zone: Tz) -> anyhow::Result<()> {
    match command {
        RecurrenceCommands::Check {
            expression,
            at,
            start,
            end,
        } => {
            let query = EvaluationQuery {
                expression,
                candidate_instant: at,
                window: CampaignWindow::new(start, end),
            };
            let matches = RecurrenceWindowEvaluator::new(zone).check(&query)?;
            println!("{}", if matches { "match" } else { "no match" });
        }
        RecurrenceCommands::Label {
            expression,
            end,
            json,
        } => {
            let label = format_label(&expression, end.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&label)?);
            } else {
                println!("{label}");
            }
        }
        RecurrenceCommands::Build {
            recurrence_type,
            start,
        } => {
            println!("{}", render_build(recurrence_type, start, zone));
        }
        RecurrenceCommands::Validate { expression } => {
            let parsed = validate(&expression)?;
            println!("valid: {parsed}");
        }
    }
    Ok(())
}

fn render_build(recurrence_type: RecurrenceType, start: DateTime<Utc>, zone: Tz) -> String {
    let label = option_label(recurrence_type, start, zone);
    match build_expression(recurrence_type, start, zone) {
        Some(expression) => format!("{expression}\t{label}"),
        None => format!("-\t{label}"),
    }
}
