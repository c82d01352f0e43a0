use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "nextep")]
#[command(about = "nextep - know which episodes you still have to watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to this file (daily rotation) instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the metadata provider for shows by name
    Search {
        /// Show name to look for
        query: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        cmd: UserCommands,
    },

    /// Manage a user's tracked shows
    Show {
        #[command(subcommand)]
        cmd: ShowCommands,
    },

    /// Move or clear the watch marker for a show
    Seen {
        /// User the marker belongs to
        #[arg(long)]
        user: String,

        /// Show id
        show_id: String,

        /// Last seen episode (S01E05, 1x05, or the raw 8-digit id)
        episode: Option<String>,

        /// Clear the marker, making every episode unseen again
        #[arg(long, conflicts_with = "episode")]
        clear: bool,
    },

    /// Unseen and upcoming episodes across a user's shows
    Overview {
        #[arg(long)]
        user: String,
    },

    /// Manage per-user poster overrides
    Poster {
        #[command(subcommand)]
        cmd: PosterCommands,
    },

    /// Re-ingest shows that changed upstream since the last sweep
    Update,

    /// Run the refresh sweep on a schedule, in the foreground
    Daemon {
        /// Skip the sweep normally run at startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sweep: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a new user (prompts for a password when not given)
    Add {
        username: String,

        /// Password (prefer the interactive prompt over shell history)
        #[arg(long)]
        password: Option<String>,
    },

    /// Verify a user's credentials interactively
    Check { username: String },
}

#[derive(Subcommand)]
enum ShowCommands {
    /// Subscribe a user to a show, ingesting it on first sight
    Add {
        #[arg(long)]
        user: String,

        show_id: String,

        /// Manual sort order; new shows sort first when omitted
        #[arg(long)]
        order: Option<f64>,
    },

    /// Unsubscribe a user from a show
    Rm {
        #[arg(long)]
        user: String,

        show_id: String,
    },

    /// List a user's shows in manual order
    Ls {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum PosterCommands {
    /// Download a provider image as the user's poster for a show
    Set {
        #[arg(long)]
        user: String,

        show_id: String,

        /// Provider image reference (URL)
        image_ref: String,
    },

    /// Remove the user's poster override
    Rm {
        #[arg(long)]
        user: String,

        show_id: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Search { query } => commands::show::run_search(&query, &output).await,
        Commands::User { cmd } => match cmd {
            UserCommands::Add { username, password } => {
                commands::user::run_user_add(&username, password, &output).await
            }
            UserCommands::Check { username } => {
                commands::user::run_user_check(&username, &output).await
            }
        },
        Commands::Show { cmd } => match cmd {
            ShowCommands::Add { user, show_id, order } => {
                commands::show::run_show_add(&user, &show_id, order, &output).await
            }
            ShowCommands::Rm { user, show_id } => {
                commands::show::run_show_rm(&user, &show_id, &output).await
            }
            ShowCommands::Ls { user } => commands::show::run_show_ls(&user, &output).await,
        },
        Commands::Seen { user, show_id, episode, clear } => {
            commands::seen::run_seen(&user, &show_id, episode, clear, &output).await
        }
        Commands::Overview { user } => commands::overview::run_overview(&user, &output).await,
        Commands::Poster { cmd } => match cmd {
            PosterCommands::Set { user, show_id, image_ref } => {
                commands::poster::run_poster_set(&user, &show_id, &image_ref, &output).await
            }
            PosterCommands::Rm { user, show_id } => {
                commands::poster::run_poster_rm(&user, &show_id, &output).await
            }
        },
        Commands::Update => commands::update::run_update(&output).await,
        Commands::Daemon { no_startup_sweep } => {
            commands::daemon::run_daemon(no_startup_sweep, &output).await
        }
    }
}
