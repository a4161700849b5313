//! Sales catalog command handlers for the CLI.
//!
//! Both sub-commands read the catalog file and never write it back; `status`
//! prints what a sweep would change.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Subcommand;
use tcgpos_core::{load_sales, plan_status_updates, AppConfig, Sale, StatusTransition};
use tcgpos_recurrence::{format_label, RecurrenceWindowEvaluator};

/// Sub-commands available under `sales`.
#[derive(Debug, Subcommand)]
pub enum SalesCommands {
    /// List sales with their schedule
    List {
        /// Catalog file (defaults to TCGPOS_SALES_PATH)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Dry-run the status sweep
    Status {
        /// Sweep instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Catalog file (defaults to TCGPOS_SALES_PATH)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Run a `sales` sub-command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or fails validation.
pub(crate) fn run_sales(command: SalesCommands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        SalesCommands::List { path } => {
            let path = path.unwrap_or_else(|| config.sales_path.clone());
            let sales = load_sales(&path, config.timezone)?.sales;
            tracing::debug!(path = %path.display(), count = sales.len(), "loaded sales catalog");
            if sales.is_empty() {
                println!("no sales found in {}", path.display());
                return Ok(());
            }
            print!("{}", render_sales(&sales, config.timezone));
        }
        SalesCommands::Status { at, path } => {
            let path = path.unwrap_or_else(|| config.sales_path.clone());
            let sales = load_sales(&path, config.timezone)?.sales;
            tracing::debug!(path = %path.display(), count = sales.len(), "loaded sales catalog");
            let evaluator = RecurrenceWindowEvaluator::new(config.timezone);
            let now = at.unwrap_or_else(Utc::now);
            let transitions = plan_status_updates(&sales, now, &evaluator);
            if transitions.is_empty() {
                println!("no status changes");
                return Ok(());
            }
            print!("{}", render_transitions(&sales, &transitions));
        }
    }
    Ok(())
}

fn schedule_text(sale: &Sale, zone: Tz) -> String {
    if !sale.is_repeating() {
        return "\u{2014}".to_string();
    }
    let end = sale
        .sale_end_datetime
        .map(|end| end.with_timezone(&zone).format("%Y/%m/%d %H:%M").to_string());
    format_label(sale.repeat_rule(), end.as_deref()).to_string()
}

fn render_sales(sales: &[Sale], zone: Tz) -> String {
    let mut out = format!("{:<6}{:<10}{:<18}{:<26}SCHEDULE\n", "ID", "STATUS", "START", "NAME");
    for sale in sales {
        let start = sale
            .start_datetime
            .with_timezone(&zone)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let _ = writeln!(
            out,
            "{:<6}{:<10}{:<18}{:<26}{}",
            sale.id,
            sale.status.to_string(),
            start,
            sale.name,
            schedule_text(sale, zone)
        );
    }
    out
}

fn render_transitions(sales: &[Sale], transitions: &[StatusTransition]) -> String {
    let mut out = format!("{:<6}{:<26}{:<10}{:<10}HISTORY\n", "ID", "NAME", "FROM", "TO");
    for transition in transitions {
        let name = sales
            .iter()
            .find(|s| s.id == transition.sale_id)
            .map_or("", |s| s.name.as_str());
        let history = if transition.history_cleared { "cleared" } else { "kept" };
        let _ = writeln!(
            out,
            "{:<6}{:<26}{:<10}{:<10}{}",
            transition.sale_id,
            name,
            transition.from.to_string(),
            transition.to.to_string(),
            history
        );
    }
    out
}
