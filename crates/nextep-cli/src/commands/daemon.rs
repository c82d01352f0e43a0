use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;
use std::time::Duration;
use tracing::{error, info};

/// Foreground sweep loop, meant to run under a process supervisor or in a
/// container. The schedule is a plain interval from config.
pub async fn run_daemon(no_startup_sweep: bool, output: &Output) -> Result<()> {
    let ctx = build_context().await?;
    let interval = Duration::from_secs(ctx.config.update.interval_hours * 3600);
    let delay = Duration::from_millis(ctx.config.update.inter_show_delay_ms);

    output.println(format!(
        "daemon started, sweeping every {}h",
        ctx.config.update.interval_hours
    ));

    if !no_startup_sweep {
        sweep(&ctx, delay).await;
    }

    loop {
        tokio::time::sleep(interval).await;
        sweep(&ctx, delay).await;
    }
}

async fn sweep(ctx: &crate::commands::context::AppContext, delay: Duration) {
    info!("starting scheduled refresh sweep");
    match ctx.store().refresh_changed_shows(delay).await {
        Ok(summary) => info!(
            checked = summary.checked,
            updated = summary.updated.len(),
            failed = summary.failed.len(),
            watermark = summary.watermark,
            "scheduled sweep done"
        ),
        Err(e) => error!(error = %e, "scheduled sweep failed"),
    }
}
