//! [El País](https://elpais.com/) homepage.
//!
//! The site exposes no article id in its markup, so the id is a hash of the
//! article slug and the publication date is the `YYYY-MM-DD` folder of the url.

mod home;

pub use home::ElPaisScraper;

use crate::utils;
use chrono::{DateTime, Utc};
use lazy_regex::regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

/// Hex characters kept from the slug digest.
pub const ID_LEN: usize = 24;

/// Truncated SHA-256 of the last path segment of `url`, without query and `.html`.
///
/// Falls back to a random id when the segment is empty; such feeds are stored
/// again on every run.
pub fn feed_id(url: &str) -> String {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();
    let slug = segment.strip_suffix(".html").unwrap_or(segment);

    if slug.is_empty() {
        let id = Uuid::new_v4().to_string();
        warn!("No slug in {}, using random id {}", url, id);
        return id;
    }

    let digest = format!("{:x}", Sha256::digest(slug.as_bytes()));
    digest[..ID_LEN].to_string()
}

/// First `YYYY-MM-DD` in `url` at midnight UTC, or the ingestion time.
pub fn publication_date(url: &str) -> DateTime<Utc> {
    regex!(r"(\d{4})-(\d{2})-(\d{2})")
        .captures(url)
        .and_then(|date| utils::midnight_utc(&date[1], &date[2], &date[3]))
        .unwrap_or_else(|| {
            debug!("No date in {}, using ingestion time", url);
            utils::get_now()
        })
}
