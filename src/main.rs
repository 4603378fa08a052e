use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use feedset::config::Config;
use feedset::feed::{combine, Feed, Fetcher, SetOp, SetOutcome};

/// Get the default config file path (~/.config/feedset/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedset")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "feedset", about = "Treat Atom and RSS feeds like sets")]
struct Args {
    /// Set operation to apply
    #[arg(value_enum)]
    op: SetOp,

    /// Feeds to operate on: names from the config `[feeds]` table, URLs, or local files
    #[arg(required = true, value_name = "SOURCE")]
    sources: Vec<String>,

    /// Config file (defaults to ~/.config/feedset/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Title for the resulting feed
    #[arg(long)]
    title: Option<String>,

    /// Write the resulting feed here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Resolves one SOURCE argument: config name, then local file, then URL or markup.
async fn load_source(source: &str, config: &Config, fetcher: &Fetcher) -> Result<Feed> {
    if let Some(value) = config.feed_source(source) {
        return Feed::from_value(value, fetcher)
            .await
            .with_context(|| format!("Failed to load configured feed '{}'", source));
    }

    let path = Path::new(source);
    if path.is_file() {
        let markup = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read feed file: {}", path.display()))?;
        return Feed::parse(&markup)
            .with_context(|| format!("Failed to parse feed file: {}", path.display()));
    }

    Feed::open(source, fetcher)
        .await
        .with_context(|| format!("Failed to load feed '{}'", source))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    let fetcher = Fetcher::new(config.fetch_policy()).context("Failed to build HTTP client")?;

    // Sources load concurrently; each feed is then only touched from this task
    let feeds = futures::future::try_join_all(
        args.sources
            .iter()
            .map(|source| load_source(source, &config, &fetcher)),
    )
    .await?;
    tracing::info!(op = %args.op, feeds = feeds.len(), "Loaded feeds");

    let operands: Vec<&Feed> = feeds.iter().collect();
    match combine(args.op, &operands)? {
        SetOutcome::Feed(mut feed) => {
            if let Some(title) = args.title {
                feed.set_title(title);
            }
            let xml = feed.to_xml()?;
            match &args.output {
                Some(path) => {
                    std::fs::write(path, xml.as_bytes())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Wrote {} entries to {}", feed.len(), path.display());
                }
                None => println!("{}", xml),
            }
        }
        SetOutcome::Bool(answer) => println!("{}", answer),
        SetOutcome::Count(count) => println!("{}", count),
    }

    Ok(())
}
