use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use colored::Colorize;
use domain_batch::{
    exception::BatchResult, model::vo::LifecycleSummary, service::JobLifecycleService,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::infrastructure::{
    config::{AppConfig, Credentials},
    console::ConsoleOperator,
    secret::EnvSecretService,
    service_provider::ServiceProvider,
};

/// Runs one lifecycle against the configured account and reports how it went.
pub async fn run(config: AppConfig) -> ExitCode {
    let console = Arc::new(ConsoleOperator::stdio());
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    println!("Batch process start: {}\n", Local::now());

    let code = match execute(&config, console.clone(), cancel).await {
        Ok(summary) => {
            if !summary.unreported.is_empty() {
                warn!("Output of {:?} could not be reported.", summary.unreported);
            }
            info!(
                job_deleted = summary.teardown.job_deleted,
                pool_deleted = summary.teardown.pool_deleted,
                "Batch run finished."
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", "Batch run failed".red());
            error!("Batch run failed: {e}");
            if e.halts_before_teardown() {
                eprintln!(
                    "Job {} and pool {} were left in place for inspection.",
                    config.orchestration.job_id, config.orchestration.pool_id
                );
            }
            ExitCode::FAILURE
        }
    };

    if config.console.pause_on_exit {
        if let Err(e) = console.wait_for_exit().await {
            eprintln!("{}: {e}", "Failed to read from console".red());
        }
    }
    code
}

async fn execute(
    config: &AppConfig,
    console: Arc<ConsoleOperator<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stdout>>,
    cancel: CancellationToken,
) -> BatchResult<LifecycleSummary> {
    let credentials = Credentials::from_env()?;
    let lifecycle =
        ServiceProvider::build(config, &credentials, Arc::new(EnvSecretService), console).await?;
    lifecycle.run(cancel).await
}

/// First ctrl-c stops the wait, a second one exits right away.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("Stopping the run (ctrl-c handling).");
    cancel.cancel();
    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}
