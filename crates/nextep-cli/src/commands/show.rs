use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::json;
use series_track_core::ShowInfoOptions;

pub async fn run_search(query: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;
    let results = ctx.store().search(query).await?;

    if output.is_json() {
        output.json(&serde_json::to_value(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        output.println(format!("no shows matching {query:?}"));
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["ID", "Name", "Started", "Ended", "Genres"]);
    for result in &results {
        table.add_row(vec![
            result.id.clone(),
            result.name.clone(),
            result.started.map(|y| y.to_string()).unwrap_or_default(),
            result.ended.map(|y| y.to_string()).unwrap_or_default(),
            result.genres.join(", "),
        ]);
    }
    output.println(table.to_string());
    Ok(())
}

pub async fn run_show_add(
    username: &str,
    show_id: &str,
    order: Option<f64>,
    output: &Output,
) -> Result<()> {
    let ctx = build_context().await?;
    ctx.library.subscribe(username, show_id, order).await?;
    output.success(format!("subscribed {username} to show {show_id}"));
    Ok(())
}

pub async fn run_show_rm(username: &str, show_id: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;
    ctx.library.unsubscribe(username, show_id).await?;
    output.success(format!("unsubscribed {username} from show {show_id}"));
    Ok(())
}

pub async fn run_show_ls(username: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;

    let mut infos = Vec::new();
    for show_id in ctx.library.show_list(username).await? {
        infos.push(ctx.store().get_show_info(username, &show_id, &ShowInfoOptions::default()).await?);
    }

    if output.is_json() {
        let rows: Vec<_> = infos
            .iter()
            .map(|info| {
                json!({
                    "show": info.show.clone(),
                    "last_seen": info.last_seen.map(|id| id.to_string()),
                })
            })
            .collect();
        output.json(&serde_json::Value::Array(rows));
        return Ok(());
    }

    if infos.is_empty() {
        output.println(format!("{username} tracks no shows"));
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Status", "Network", "Seasons", "First aired"]);
    for info in &infos {
        table.add_row(vec![
            info.show.id.clone(),
            info.show.name.clone(),
            info.show.status.to_string(),
            info.show.network.clone().unwrap_or_default(),
            info.show.seasons.to_string(),
            info.show.first_aired.map(|d| d.to_string()).unwrap_or_default(),
        ]);
    }
    output.println(table.to_string());
    Ok(())
}
