mod api;
mod board;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tcgpos_recurrence::RecurrenceWindowEvaluator;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    board::SaleBoard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(tcgpos_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sales = tcgpos_core::load_sales(&config.sales_path, config.timezone)?.sales;
    tracing::info!(
        count = sales.len(),
        path = %config.sales_path.display(),
        timezone = config.timezone.name(),
        "loaded sales catalog"
    );

    let board = SaleBoard::new(sales);
    let evaluator = RecurrenceWindowEvaluator::new(config.timezone);

    let _scheduler = scheduler::build_scheduler(
        board.clone(),
        evaluator.clone(),
        &config.status_sweep_cron,
    )
    .await?;

    let app = build_app(AppState { board, evaluator }, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
