use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use futures::future::join_all;
use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

pub mod elmundo;
pub mod elpais;

mod data;
mod error;
mod utils;

pub use data::{FeedData, Table};
pub use error::{FetchError, IngestError};

/// Upper bound for a single homepage request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One article found on a homepage, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedFeed {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub publication_date: DateTime<Utc>,
}

/// A feed as persisted by a [`Storage`]; `creation_date` is set by the first upsert only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFeed {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub publication_date: DateTime<Utc>,
    pub creation_date: DateTime<Utc>,
}

impl fmt::Display for StoredFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id              : {}", self.id)?;
        writeln!(f, "Title           : {}", self.title)?;
        writeln!(f, "Source          : {}", self.source)?;
        writeln!(f, "Url             : {}", self.url)?;
        writeln!(
            f,
            "Author          : {}",
            self.author.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Published Date  : {}", self.publication_date)?;
        writeln!(f, "Created Date    : {}", self.creation_date)?;
        writeln!(
            f,
            "Summary         : {}",
            self.summary.as_deref().unwrap_or("None")
        )?;
        writeln!(
            f,
            "Image           : {}",
            self.image_url.as_deref().unwrap_or("None")
        )?;
        Ok(())
    }
}

/// A news site whose homepage can be turned into [`ScrapedFeed`]s.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// Display name stored with every feed.
    fn source(&self) -> &str;
    fn homepage_url(&self) -> &str;

    /// Encoding label of the homepage. Overrides whatever the response declares.
    fn charset(&self) -> &'static str {
        "utf-8"
    }

    /// Article blocks missing a title or url are skipped.
    fn parse(&self, doc: &Html) -> Vec<ScrapedFeed>;

    async fn fetch(&self, client: &Client) -> Result<String, FetchError> {
        let url = self.homepage_url();
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        debug!("Visit {}", url);
        let response = client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        let encoding = Encoding::for_label(self.charset().as_bytes()).unwrap_or(UTF_8);
        let (html, _, malformed) = encoding.decode(&body);
        if malformed {
            warn!("{} is not valid {}", url, encoding.name());
        }
        Ok(html.into_owned())
    }

    async fn fetch_and_parse(&self, client: &Client) -> Result<Vec<ScrapedFeed>, FetchError> {
        let html = self.fetch(client).await?;
        let feeds = {
            let doc = Html::parse_document(&html);
            self.parse(&doc)
        };
        Ok(feeds)
    }
}

/// Persistence used by [`run_scrapers`], keyed by [`ScrapedFeed::id`].
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Inserts the feed or replaces every field of the existing one except its creation date.
    async fn upsert(&self, feed: ScrapedFeed) -> Result<StoredFeed, IngestError>;

    /// Up to `limit` feeds of `source`, newest publication first.
    async fn top_by_source(&self, source: &str, limit: u32)
        -> Result<Vec<StoredFeed>, IngestError>;

    async fn latest(&self, limit: u32) -> Result<Vec<StoredFeed>, IngestError>;
    async fn get(&self, id: &str) -> Result<StoredFeed, IngestError>;
    async fn delete(&self, id: &str) -> Result<(), IngestError>;
    async fn count(&self) -> Result<u32, IngestError>;
}

/// Every supported site.
pub fn default_scrapers() -> Vec<Arc<dyn Scraper>> {
    vec![
        Arc::new(elpais::ElPaisScraper),
        Arc::new(elmundo::ElMundoScraper),
    ]
}

pub fn http_client() -> Result<Client, IngestError> {
    Ok(Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(FETCH_TIMEOUT)
        .build()?)
}

/// Scrapes every site concurrently and upserts what they return.
///
/// A site that fails to fetch, a feed that fails to store, or a panicking task
/// only loses its own contribution. Returns once every site is done.
pub async fn run_scrapers<S>(
    scrapers: &[Arc<dyn Scraper>],
    storage: Arc<S>,
    client: &Client,
) -> Result<(), IngestError>
where
    S: Storage + 'static,
{
    if scrapers.is_empty() {
        return Err(IngestError::NoScrapers);
    }

    let (sources, tasks): (Vec<_>, Vec<_>) = scrapers
        .iter()
        .map(|scraper| {
            let source = scraper.source().to_string();
            let task = tokio::spawn(handle(
                Arc::clone(scraper),
                Arc::clone(&storage),
                client.clone(),
            ));
            (source, task)
        })
        .unzip();

    for (source, result) in sources.iter().zip(join_all(tasks).await) {
        if let Err(e) = result {
            error!("[{}] Scraping task aborted: {}", source, e);
        }
    }

    Ok(())
}

async fn handle<S>(scraper: Arc<dyn Scraper>, storage: Arc<S>, client: Client)
where
    S: Storage,
{
    let source = scraper.source();
    info!("[{}] Start scraping {}", source, scraper.homepage_url());

    let feeds = match scraper.fetch_and_parse(&client).await {
        Ok(feeds) => feeds,
        Err(e) => {
            error!("[{}] Error during scraping: {}", source, e);
            return;
        }
    };

    let total = feeds.len();
    let mut stored = 0;
    for feed in feeds {
        let id = feed.id.clone();
        match storage.upsert(feed).await {
            Ok(_) => stored += 1,
            Err(e) => error!("[{}] Failed to store feed {}: {}", source, id, e),
        }
    }

    info!(
        "[{}] Scraping finished, {} of {} feeds stored",
        source, stored, total
    );
}
