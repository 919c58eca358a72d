use clap::{Parser, Subcommand};
use spanish_media_scraper::{
    default_scrapers, http_client, run_scrapers, FeedData, IngestError, Storage, StoredFeed,
};
use std::sync::Arc;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(version, about = "Collects the front page news of Spanish newspapers")]
struct Cli {
    /// SQLite database file, created if missing
    #[arg(short, long, default_value = "feeds.db")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape every homepage once and store what was found
    Scrape,
    /// Most recent feeds of one source, or of every source
    Top {
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    /// Most recent feeds across all sources
    Latest {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    /// Print a stored feed
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Remove a stored feed
    Delete { id: String },
}

fn print_feeds(feeds: &[StoredFeed], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(feeds)?);
    } else {
        for feed in feeds {
            println!("{}", feed);
        }
    }
    Ok(())
}

/// Fails with [`IngestError::NotFound`] so a missing id gives a non-zero exit status.
async fn delete_feed<S: Storage>(storage: &S, id: &str) -> Result<(), IngestError> {
    storage.delete(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    let storage = Arc::new(FeedData::new(&cli.database).await?);

    match cli.command {
        Command::Scrape => {
            let scrapers = default_scrapers();
            run_scrapers(&scrapers, storage.clone(), &http_client()?).await?;
            info!("{} feeds stored", storage.count().await?);
            println!("Ingestion executed");
        }
        Command::Top {
            source,
            limit,
            json,
        } => {
            let sources = match source {
                Some(source) => vec![source],
                None => default_scrapers()
                    .iter()
                    .map(|s| s.source().to_string())
                    .collect(),
            };
            let mut feeds = vec![];
            for source in &sources {
                feeds.extend(storage.top_by_source(source, limit).await?);
            }
            print_feeds(&feeds, json)?;
        }
        Command::Latest { limit, json } => {
            print_feeds(&storage.latest(limit).await?, json)?;
        }
        Command::Show { id, json } => {
            let feed = storage.get(&id).await?;
            print_feeds(std::slice::from_ref(&feed), json)?;
        }
        Command::Delete { id } => delete_feed(storage.as_ref(), &id).await?,
    }

    Ok(())
}
