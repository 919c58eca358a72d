use super::{feed_id, publication_date};
use crate::{utils, ScrapedFeed, Scraper};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub(crate) const HOMEPAGE_URL: &str = "https://elpais.com/";

const E: &str = "Invalid selector";
lazy_static! {
    static ref ARTICLE: Selector = Selector::parse("article").expect(E);
    static ref TITLE: Selector = Selector::parse("h2.c_t a").expect(E);
    static ref SUMMARY: Selector = Selector::parse("p.c_d").expect(E);
    static ref AUTHOR: Selector = Selector::parse("div.c_a a").expect(E);
    static ref IMAGE: Selector = Selector::parse("figure img").expect(E);
}

#[derive(Debug)]
pub struct ElPaisScraper;

impl ElPaisScraper {
    fn parse_article(&self, article: ElementRef) -> Option<ScrapedFeed> {
        let link = article.select(&TITLE).next();
        let title = link.map(utils::text_of).unwrap_or_default();
        let url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| utils::absolute_url(HOMEPAGE_URL, href));

        let (title, url) = match (title.is_empty(), url) {
            (false, Some(url)) => (title, url),
            _ => {
                debug!("[{}] Skip article without title or url", self.source());
                return None;
            }
        };

        let summary = article
            .select(&SUMMARY)
            .next()
            .map(utils::text_of)
            .and_then(utils::non_empty);

        let author = article
            .select(&AUTHOR)
            .next()
            .map(utils::text_of)
            .and_then(utils::non_empty);

        let image_url = article
            .select(&IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| utils::absolute_url(HOMEPAGE_URL, src));

        Some(ScrapedFeed {
            id: feed_id(&url),
            publication_date: publication_date(&url),
            title,
            summary,
            author,
            source: self.source().to_string(),
            url,
            image_url,
        })
    }
}

#[async_trait::async_trait]
impl Scraper for ElPaisScraper {
    fn source(&self) -> &str {
        "El País"
    }

    fn homepage_url(&self) -> &str {
        HOMEPAGE_URL
    }

    fn parse(&self, doc: &Html) -> Vec<ScrapedFeed> {
        doc.select(&ARTICLE)
            .filter_map(|article| self.parse_article(article))
            .collect()
    }
}
