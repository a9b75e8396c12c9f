//! Sync commands.

use super::CliContext;
use crate::Result;
use crate::config::sync_period;
use crate::services::SyncOutcome;
use tokio::sync::broadcast::error::RecvError;

/// Runs one sync cycle and prints its summary.
///
/// # Errors
///
/// Returns an error if the fetch fails or the store cannot be saved.
pub async fn cmd_sync(ctx: &CliContext) -> Result<()> {
    match ctx.agent()?.run_cycle().await? {
        SyncOutcome::Completed(stats) => println!("{}", stats.summary()),
        SyncOutcome::Skipped => println!("Sync already in progress"),
    }
    Ok(())
}

/// Syncs every `interval_secs` until Ctrl-C, printing notifications.
///
/// # Errors
///
/// Returns an error if the interval is zero or the agent cannot be built.
pub async fn cmd_watch(ctx: &CliContext, interval_secs: Option<u64>) -> Result<()> {
    let period = match interval_secs {
        Some(secs) => sync_period(secs)?,
        None => ctx.config().sync.period()?,
    };
    let agent = ctx.agent()?;
    let mut notifications = ctx.lock()?.notifications().subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => println!(
                    "{} {notification}",
                    notification.timestamp.format("%H:%M:%S")
                ),
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Notification printer lagged");
                },
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!(
        "Syncing with {} every {}s (Ctrl-C to stop)",
        ctx.config().sync.endpoint,
        period.as_secs()
    );
    agent
        .run(period, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C, stopping");
            }
        })
        .await;

    printer.abort();
    Ok(())
}
