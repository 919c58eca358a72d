use super::publication_date;
use crate::{utils, ScrapedFeed, Scraper};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub(crate) const HOMEPAGE_URL: &str = "https://www.elmundo.es/";

const E: &str = "Invalid selector";
lazy_static! {
    static ref ARTICLE: Selector = Selector::parse("article[ue-article-id]").expect(E);
    static ref LINK: Selector = Selector::parse("header > a").expect(E);
    static ref TITLE: Selector = Selector::parse("header > a > h2").expect(E);
    static ref AUTHOR: Selector =
        Selector::parse(".ue-c-cover-content__byline-name a").expect(E);
    static ref IMAGE: Selector = Selector::parse("figure img").expect(E);
}

#[derive(Debug)]
pub struct ElMundoScraper;

impl ElMundoScraper {
    fn parse_article(&self, article: ElementRef) -> Option<ScrapedFeed> {
        let title = article
            .select(&TITLE)
            .next()
            .map(utils::text_of)
            .unwrap_or_default();
        let url = article
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| utils::absolute_url(HOMEPAGE_URL, href));

        let (title, url) = match (title.is_empty(), url) {
            (false, Some(url)) => (title, url),
            _ => {
                debug!("[{}] Skip article without title or url", self.source());
                return None;
            }
        };

        let id = match article.value().attr("ue-article-id").map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                debug!("[{}] No article id, using url {}", self.source(), url);
                url.clone()
            }
        };

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
            id,
            publication_date: publication_date(&url),
            title,
            summary: None,
            author,
            source: self.source().to_string(),
            url,
            image_url,
        })
    }
}

#[async_trait::async_trait]
impl Scraper for ElMundoScraper {
    fn source(&self) -> &str {
        "El Mundo"
    }

    fn homepage_url(&self) -> &str {
        HOMEPAGE_URL
    }

    fn charset(&self) -> &'static str {
        "iso-8859-15"
    }

    fn parse(&self, doc: &Html) -> Vec<ScrapedFeed> {
        doc.select(&ARTICLE)
            .filter_map(|article| self.parse_article(article))
            .collect()
    }
}
