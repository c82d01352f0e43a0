use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use series_track_models::EpisodeId;

/// Accepts the raw 8-digit identifier ("00010005"), "S01E05", or "1x05".
fn parse_episode_arg(raw: &str) -> Result<EpisodeId> {
    if let Ok(id) = raw.parse::<EpisodeId>() {
        return Ok(id);
    }

    let lower = raw.to_lowercase();
    let parts = lower
        .strip_prefix('s')
        .and_then(|rest| rest.split_once('e'))
        .or_else(|| lower.split_once('x'));

    let (season, episode) =
        parts.ok_or_else(|| eyre!("cannot parse episode {raw:?}: use S01E05, 1x05, or the 8-digit id"))?;

    Ok(EpisodeId::new(
        season.parse().map_err(|_| eyre!("bad season in {raw:?}"))?,
        episode.parse().map_err(|_| eyre!("bad episode in {raw:?}"))?,
    ))
}

pub async fn run_seen(
    username: &str,
    show_id: &str,
    episode: Option<String>,
    clear: bool,
    output: &Output,
) -> Result<()> {
    let ctx = build_context().await?;

    if clear {
        ctx.library.set_watch_marker(username, show_id, None).await?;
        output.success(format!("cleared watch marker for show {show_id}"));
        return Ok(());
    }

    let raw = episode.ok_or_else(|| eyre!("pass an episode or --clear"))?;
    let episode = parse_episode_arg(&raw)?;
    ctx.library.set_watch_marker(username, show_id, Some(episode)).await?;
    output.success(format!(
        "marked show {show_id} as seen through S{:02}E{:02}",
        episode.season(),
        episode.episode()
    ));
    Ok(())
}
