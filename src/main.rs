use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsreel::app::AppContext;
use newsreel::cli::{commands, BookmarkAction, Cli, Commands};
use newsreel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Config::from_env()
    });
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Headlines(args) => {
            commands::headlines(&ctx, &args).await?;
        }
        Commands::Search { query, listing } => {
            commands::search(&ctx, &query, &listing).await?;
        }
        Commands::Bookmarks { action } => match action {
            BookmarkAction::List => commands::list_bookmarks(&ctx).await?,
            BookmarkAction::Add { url, title } => {
                commands::add_bookmark(&ctx, &url, title).await?
            }
            BookmarkAction::Remove { url } => commands::remove_bookmark(&ctx, &url).await?,
        },
    }

    Ok(())
}
