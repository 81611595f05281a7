use anyhow::Context;
use clap::Parser;
use page_marker::{Config, MarkingSession};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mark the interactable elements of a page and print the records as JSON.
#[derive(Parser, Debug)]
#[command(name = "page-marker", version)]
struct Args {
    /// Page to open
    url: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Recolor this marked element after marking, and back before exiting
    #[arg(long)]
    emphasize: Option<usize>,

    /// Seconds to keep the page open before exiting
    #[arg(long, default_value_t = 0)]
    hold: u64,

    /// Remove the overlays before exiting
    #[arg(long)]
    cleanup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let url = url::Url::parse(&args.url).with_context(|| format!("invalid url {}", args.url))?;

    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(width) = args.width {
        config.browser.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.browser.viewport.height = height;
    }

    let mut session = MarkingSession::with_config(config)
        .await
        .context("starting browser")?;
    session.navigate(url.as_str()).await?;
    info!(url = %session.current_url().await?, "page loaded");

    let marks = session.mark_page().await.context("marking page")?;
    println!("{}", serde_json::to_string_pretty(&marks)?);

    if let Some(id) = args.emphasize {
        session.emphasize(id).await?;
        info!(id, xpath = session.xpath_of(id)?, "emphasized");
    }

    if args.hold > 0 {
        tokio::time::sleep(tokio::time::Duration::from_secs(args.hold)).await;
    }

    if let Some(id) = args.emphasize {
        session.restore(id).await?;
    }

    if args.cleanup {
        session.clear_marks().await?;
    }
    session.close().await?;
    Ok(())
}
