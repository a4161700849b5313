//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring sale status sweep.

use chrono::Utc;
use tcgpos_recurrence::RecurrenceWindowEvaluator;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::board::SaleBoard;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the sweep job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    board: SaleBoard,
    evaluator: RecurrenceWindowEvaluator,
    sweep_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_status_sweep_job(&scheduler, board, evaluator, sweep_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the sale status sweep.
///
/// Runs on `sweep_cron` (default every 10 minutes, `0 */10 * * * *`) in UTC;
/// the sweep itself floors the run time onto the 10-minute grid of the
/// operating zone.
async fn register_status_sweep_job(
    scheduler: &JobScheduler,
    board: SaleBoard,
    evaluator: RecurrenceWindowEvaluator,
    sweep_cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(sweep_cron, move |_uuid, _lock| {
        let board = board.clone();
        let evaluator = evaluator.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting sale status sweep");
            match board.sweep(Utc::now(), &evaluator).await {
                Ok(report) => tracing::info!(
                    at = %report.at,
                    transitions = report.transitions.len(),
                    "scheduler: sale status sweep complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: sale status sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %sweep_cron, "scheduler: registered status sweep job");
    Ok(())
}
