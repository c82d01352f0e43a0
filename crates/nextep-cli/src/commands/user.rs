use crate::commands::context::build_context;
use crate::output::Output;
use color_eyre::Result;

pub async fn run_user_add(username: &str, password: Option<String>, output: &Output) -> Result<()> {
    let ctx = build_context().await?;

    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ")?,
    };

    ctx.library.register(username, &password).await?;
    output.success(format!("registered user {}", username.to_lowercase()));
    Ok(())
}

pub async fn run_user_check(username: &str, output: &Output) -> Result<()> {
    let ctx = build_context().await?;

    let password = rpassword::prompt_password("Password: ")?;
    if ctx.library.authenticate(username, &password).await? {
        output.success("credentials ok");
    } else {
        output.error("authentication failed");
        std::process::exit(1);
    }
    Ok(())
}
