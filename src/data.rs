use crate::{utils, IngestError, ScrapedFeed, Storage, StoredFeed};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use std::{fmt::Display, str::FromStr};

#[async_trait::async_trait]
pub trait Table {
    type Record;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    async fn create(&self) -> Result<(), sqlx::Error>;
    async fn upsert(&self, record: Self::Record) -> Result<(), sqlx::Error>;

    async fn is_exist<I: AsRef<str> + Display + Send + Sync>(
        &self,
        id: I,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT id FROM {} WHERE id = ?", self.get_name());
        Ok(sqlx::query(&query)
            .bind(id.as_ref())
            .fetch_optional(self.get_pool())
            .await?
            .is_some())
    }

    async fn delete<I: AsRef<str> + Send + Sync>(&self, id: I) -> Result<(), sqlx::Error> {
        let query = format!(r#"DELETE FROM {} WHERE id = ?"#, self.get_name());
        sqlx::query(&query)
            .bind(id.as_ref())
            .execute(self.get_pool())
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }
}

const FEED_COLUMNS: &str =
    "id, title, summary, author, source, url, image_url, publication_date, creation_date";

pub struct FeedTable {
    name: String,
    pool: SqlitePool,
}

impl FeedTable {
    fn select(&self, filter: &str) -> String {
        format!("SELECT {} FROM {} {}", FEED_COLUMNS, self.name, filter)
    }

    async fn find(&self, id: &str) -> Result<Option<StoredFeed>, sqlx::Error> {
        sqlx::query(&self.select("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| stored_feed(&row))
            .transpose()
    }
}

#[async_trait::async_trait]
impl Table for FeedTable {
    type Record = ScrapedFeed;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(self.get_pool(), &self.name).await? {
            let query = format!(
                r#"
                        CREATE TABLE {} (
                            id TEXT PRIMARY KEY,
                            title TEXT NOT NULL,
                            summary TEXT,
                            author TEXT,
                            source TEXT NOT NULL,
                            url TEXT NOT NULL,
                            image_url TEXT,
                            publication_date DATETIME NOT NULL,
                            creation_date DATETIME NOT NULL
                        )
                    "#,
                &self.name
            );
            sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        }
        Ok(())
    }

    async fn upsert(&self, record: Self::Record) -> Result<(), sqlx::Error> {
        let mut tx = self.get_pool().begin().await?;
        // creation_date is only written by the INSERT branch.
        let query = format!(
            r#"INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                author = excluded.author,
                source = excluded.source,
                url = excluded.url,
                image_url = excluded.image_url,
                publication_date = excluded.publication_date"#,
            self.name, FEED_COLUMNS
        );
        sqlx::query(&query)
            .bind(record.id)
            .bind(record.title)
            .bind(record.summary)
            .bind(record.author)
            .bind(record.source)
            .bind(record.url)
            .bind(record.image_url)
            .bind(record.publication_date)
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn stored_feed(row: &SqliteRow) -> Result<StoredFeed, sqlx::Error> {
    Ok(StoredFeed {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        author: row.try_get("author")?,
        source: row.try_get("source")?,
        url: row.try_get("url")?,
        image_url: row.try_get("image_url")?,
        publication_date: row.try_get("publication_date")?,
        creation_date: row.try_get("creation_date")?,
    })
}

/// SQLite-backed feed store. Safe to share between concurrent scraping tasks.
pub struct FeedData {
    feeds: FeedTable,
}

impl FeedData {
    pub async fn new(filename: &str) -> Result<FeedData, IngestError> {
        let opt = SqliteConnectOptions::new()
            .filename(filename)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        FeedData::with_pool(pool).await
    }

    /// A private database living as long as the pool's only connection.
    pub async fn in_memory() -> Result<FeedData, IngestError> {
        let opt = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opt)
            .await?;
        FeedData::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<FeedData, IngestError> {
        let feeds = FeedTable {
            name: "feeds".to_string(),
            pool,
        };
        if !utils::is_table_exists(feeds.get_pool(), feeds.get_name()).await? {
            tracing::debug!("Create table {}", feeds.get_name());
            feeds.create().await?;
        } else {
            tracing::debug!("Use table {}", feeds.get_name());
        }
        Ok(FeedData { feeds })
    }

    async fn fetch_all(
        &self,
        query: &str,
        binds: &[&str],
        limit: u32,
    ) -> Result<Vec<StoredFeed>, IngestError> {
        let mut query = sqlx::query(query);
        for bind in binds {
            query = query.bind(*bind);
        }
        let mut feeds = vec![];
        for row in query.bind(limit).fetch_all(self.feeds.get_pool()).await? {
            feeds.push(stored_feed(&row)?);
        }
        Ok(feeds)
    }
}

#[async_trait::async_trait]
impl Storage for FeedData {
    async fn upsert(&self, feed: ScrapedFeed) -> Result<StoredFeed, IngestError> {
        let id = feed.id.clone();
        self.feeds.upsert(feed).await?;
        self.get(&id).await
    }

    async fn top_by_source(
        &self,
        source: &str,
        limit: u32,
    ) -> Result<Vec<StoredFeed>, IngestError> {
        let query = self
            .feeds
            .select("WHERE source = ? ORDER BY publication_date DESC, rowid ASC LIMIT ?");
        self.fetch_all(&query, &[source], limit).await
    }

    async fn latest(&self, limit: u32) -> Result<Vec<StoredFeed>, IngestError> {
        let query = self
            .feeds
            .select("ORDER BY publication_date DESC, rowid ASC LIMIT ?");
        self.fetch_all(&query, &[], limit).await
    }

    async fn get(&self, id: &str) -> Result<StoredFeed, IngestError> {
        self.feeds
            .find(id)
            .await?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), IngestError> {
        if !self.feeds.is_exist(id).await? {
            return Err(IngestError::NotFound(id.to_string()));
        }
        Ok(self.feeds.delete(id).await?)
    }

    async fn count(&self) -> Result<u32, IngestError> {
        Ok(self.feeds.count().await?)
    }
}
