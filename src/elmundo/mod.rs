mod home;

pub use home::ElMundoScraper;

use crate::utils;
use chrono::{DateTime, Utc};
use lazy_regex::regex;
use tracing::debug;

/// Midnight UTC of the `/YYYY/MM/DD/` folders in `url`, or the ingestion time.
pub fn publication_date(url: &str) -> DateTime<Utc> {
    regex!(r"/(\d{4})/(\d{2})/(\d{2})/")
        .captures(url)
        .and_then(|date| utils::midnight_utc(&date[1], &date[2], &date[3]))
        .unwrap_or_else(|| {
            debug!("No date in {}, using ingestion time", url);
            utils::get_now()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScrapedFeed, Scraper};
    use chrono::{Datelike, TimeZone};
    use pretty_assertions::assert_eq;
    use scraper::Html;
    use std::fs;

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn date_from_url() {
        let date = publication_date("https://www.elmundo.es/2025/08/04/noticia.html");
        assert_eq!((date.year(), date.month(), date.day()), (2025, 8, 4));
        assert_eq!(date, midnight(2025, 8, 4));
    }

    #[test]
    fn date_falls_back_to_ingestion_time() {
        let before = utils::get_now();
        for url in [
            "https://www.elmundo.es/opinion/editorial.html",
            "https://www.elmundo.es/2025-08-04/noticia.html",
            "https://www.elmundo.es/2025/08/04",
            "https://www.elmundo.es/2025/02/31/noticia.html",
        ] {
            let date = publication_date(url);
            assert!(date >= before, "{} should use the ingestion time", url);
        }
    }

    #[test]
    fn parse_single_article() {
        let html = Html::parse_document(
            r#"<article ue-article-id="123">
              <header><a href="https://www.elmundo.es/2025/08/04/feed.html"><h2>Test title</h2></a></header>
              <div class="ue-c-cover-content__byline-name"><a>Test author</a></div>
              <figure><img src="https://elmundo.es/image.jpg"/></figure>
            </article>"#,
        );
        let feeds = ElMundoScraper.parse(&html);

        assert_eq!(
            feeds,
            vec![ScrapedFeed {
                id: "123".to_string(),
                title: "Test title".to_string(),
                summary: None,
                author: Some("Test author".to_string()),
                source: "El Mundo".to_string(),
                url: "https://www.elmundo.es/2025/08/04/feed.html".to_string(),
                image_url: Some("https://elmundo.es/image.jpg".to_string()),
                publication_date: midnight(2025, 8, 4),
            }]
        );
    }

    #[test]
    fn test_parsing_homepage() {
        let html = fs::read_to_string("tests/htmls/elmundo.html").expect("Invalid file path");
        let html = Html::parse_document(&html);

        let before = utils::get_now();
        let mut feeds = ElMundoScraper.parse(&html);

        assert_eq!(feeds.len(), 3);
        let editorial = feeds.pop().unwrap();
        assert!(editorial.publication_date >= before);
        assert_eq!(
            editorial,
            ScrapedFeed {
                id: "68907a1bfc6c83a1408b4610".to_string(),
                title: "Editorial: el verano de los incendios".to_string(),
                summary: None,
                author: None,
                source: "El Mundo".to_string(),
                url: "https://www.elmundo.es/opinion/editorial.html".to_string(),
                image_url: Some("https://www.elmundo.es/assets/opinion.png".to_string()),
                publication_date: editorial.publication_date,
            }
        );

        assert_eq!(
            feeds,
            vec![
                ScrapedFeed {
                    id: "68907a1bfc6c83a1408b4591".to_string(),
                    title: "Sánchez convoca al Consejo de Seguridad Nacional".to_string(),
                    summary: None,
                    author: Some("Lucía Méndez".to_string()),
                    source: "El Mundo".to_string(),
                    url: "https://www.elmundo.es/espana/2025/08/04/68907a1bfc6c83a1408b4591.html"
                        .to_string(),
                    image_url: Some(
                        "https://phantom-elmundo.unidadeditorial.es/portada.jpg".to_string()
                    ),
                    publication_date: midnight(2025, 8, 4),
                },
                // Empty native id: the url stands in for it.
                ScrapedFeed {
                    id: "https://www.elmundo.es/economia/2025/08/02/el-ibex-cierra-en-verde.html"
                        .to_string(),
                    title: "El Ibex cierra en verde".to_string(),
                    summary: None,
                    author: None,
                    source: "El Mundo".to_string(),
                    url: "https://www.elmundo.es/economia/2025/08/02/el-ibex-cierra-en-verde.html"
                        .to_string(),
                    image_url: None,
                    publication_date: midnight(2025, 8, 2),
                },
            ]
        );
    }

    #[test]
    fn skips_articles_without_title_or_url() {
        let html = Html::parse_document(
            r#"<div>
              <article ue-article-id="1"><header><a href="/2025/08/04/a.html"><h2> </h2></a></header></article>
              <article ue-article-id="2"><header><a><h2>Sin enlace</h2></a></header></article>
              <article ue-article-id="3"><header><a href="/2025/08/04/c.html"><h2>Buena</h2></a></header></article>
              <article><header><a href="/2025/08/04/d.html"><h2>Sin marca</h2></a></header></article>
            </div>"#,
        );
        let feeds = ElMundoScraper.parse(&html);
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].id, "3");
        assert_eq!(feeds[0].url, "https://www.elmundo.es/2025/08/04/c.html");
    }

    #[test]
    fn declares_its_encoding() {
        assert_eq!(ElMundoScraper.charset(), "iso-8859-15");
        assert_eq!(ElMundoScraper.homepage_url(), "https://www.elmundo.es/");
    }
}
