use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::time::Duration;

pub async fn run_update(output: &Output) -> Result<()> {
    let ctx = build_context().await?;
    let delay = Duration::from_millis(ctx.config.update.inter_show_delay_ms);

    let spinner = if output.is_json() {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("refreshing changed shows…");
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    };

    let summary = ctx.store().refresh_changed_shows(delay).await;
    spinner.finish_and_clear();
    let summary = summary?;

    if output.is_json() {
        output.json(&json!({
            "checked": summary.checked,
            "updated": summary.updated,
            "failed": summary.failed,
            "watermark": summary.watermark,
        }));
        return Ok(());
    }

    output.success(format!(
        "refreshed {} of {} changed shows (watermark {})",
        summary.updated.len(),
        summary.checked,
        summary.watermark
    ));
    for show_id in &summary.failed {
        output.warn(format!("show {show_id} failed to refresh, will retry next sweep"));
    }
    Ok(())
}
