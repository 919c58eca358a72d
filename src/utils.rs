use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use itertools::Itertools;
use scraper::ElementRef;
use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

/// Ingestion time, truncated to milliseconds so it survives a round trip through the store.
pub(crate) fn get_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn midnight_utc(year: &str, month: &str, day: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// All text below `el` with runs of whitespace collapsed to a single space.
pub(crate) fn text_of(el: ElementRef) -> String {
    el.text().flat_map(str::split_whitespace).join(" ")
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Resolves `href` against `base`, leaving absolute links untouched.
pub(crate) fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    reqwest::Url::parse(base)
        .and_then(|base| base.join(href))
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    #[test]
    fn midnight_from_segments() {
        let date = midnight_utc("2025", "08", "04").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 8, 4));
        assert_eq!(date.to_rfc3339(), "2025-08-04T00:00:00+00:00");
    }

    #[test]
    fn midnight_rejects_impossible_dates() {
        assert!(midnight_utc("2025", "13", "01").is_none());
        assert!(midnight_utc("2025", "02", "30").is_none());
    }

    #[test]
    fn text_is_trimmed_and_joined() {
        let html = Html::parse_fragment("<h2>\n  Hola <em>mundo</em>\n   cruel  \n</h2>");
        let h2 = html
            .select(&Selector::parse("h2").unwrap())
            .next()
            .unwrap();
        assert_eq!(text_of(h2), "Hola mundo cruel");
    }

    #[test]
    fn relative_links_are_resolved() {
        assert_eq!(
            absolute_url("https://elpais.com/", "/espana/2025-08-04/a.html").as_deref(),
            Some("https://elpais.com/espana/2025-08-04/a.html")
        );
        assert_eq!(
            absolute_url("https://elpais.com/", "https://cincodias.elpais.com/x.html").as_deref(),
            Some("https://cincodias.elpais.com/x.html")
        );
        assert_eq!(absolute_url("https://elpais.com/", "   "), None);
    }
}
