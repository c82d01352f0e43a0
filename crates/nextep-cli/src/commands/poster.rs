use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;
use series_track_core::PosterStatus;

pub async fn run_poster_set(
    username: &str,
    show_id: &str,
    image_ref: &str,
    output: &Output,
) -> Result<()> {
    let ctx = build_context().await?;
    let username = username.to_lowercase();

    match ctx.store().posters().set_custom(&username, show_id, image_ref).await? {
        PosterStatus::Saved => output.success(format!("custom poster saved for show {show_id}")),
        PosterStatus::NotFound => {
            output.error(format!("provider has no image at {image_ref:?}"));
            std::process::exit(1);
        }
    }
    Ok(())
}

pub async fn run_poster_rm(username: &str, show_id: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;
    let username = username.to_lowercase();

    if ctx.store().posters().delete_custom(&username, show_id)? {
        output.success(format!("removed custom poster for show {show_id}"));
    } else {
        output.warn(format!("no custom poster for show {show_id}"));
    }
    Ok(())
}
