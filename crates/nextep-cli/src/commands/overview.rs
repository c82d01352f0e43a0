use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use series_track_core::{build_overview, OverviewEntry};
use series_track_models::Episode;

fn episode_tag(episode: &Episode) -> String {
    format!("S{:02}E{:02}", episode.season(), episode.number())
}

fn entry_json(entry: &OverviewEntry) -> serde_json::Value {
    let episodes = |list: &[Episode]| {
        list.iter()
            .map(|e| {
                json!({
                    "id": e.id.to_string(),
                    "title": e.title,
                    "airdate": e.air_date.to_string(),
                })
            })
            .collect::<Vec<_>>()
    };

    json!({
        "show": entry.show.clone(),
        "unseen": episodes(&entry.unseen),
        "upcoming": episodes(&entry.upcoming),
    })
}

pub async fn run_overview(username: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;

    let today = chrono::Local::now().date_naive();
    let overview = build_overview(&ctx.library, username, today).await?;

    if output.is_json() {
        output.json(&json!({
            "unseen": overview.unseen.iter().map(entry_json).collect::<Vec<_>>(),
            "upcoming": overview.upcoming.iter().map(entry_json).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    let limit = ctx.library.settings(username).await?.episodes_per_show as usize;

    if overview.unseen.is_empty() && overview.upcoming.is_empty() {
        output.println("all caught up, nothing unseen or upcoming");
        return Ok(());
    }

    if !overview.unseen.is_empty() {
        output.println(format!("{}", "Unseen".bold()));
        for entry in &overview.unseen {
            output.println(format!(
                "  {} ({} unseen)",
                entry.show.name,
                entry.unseen.len()
            ));
            for episode in entry.unseen.iter().take(limit) {
                output.println(format!(
                    "    {}  {}  {}",
                    episode_tag(episode),
                    episode.air_date,
                    episode.title
                ));
            }
            if entry.unseen.len() > limit {
                output.println(format!("    … and {} more", entry.unseen.len() - limit));
            }
        }
    }

    if !overview.upcoming.is_empty() {
        output.println(format!("{}", "Upcoming".bold()));
        for entry in &overview.upcoming {
            let next = &entry.upcoming[0];
            output.println(format!(
                "  {}  {}  {}  {}",
                entry.show.name,
                episode_tag(next),
                next.air_date,
                next.title
            ));
        }
    }

    Ok(())
}
