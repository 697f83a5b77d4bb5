//! CSV row shapes of the Finviz exports.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::core::{normalize_ticker, Headline};

/// Timestamp layout of the news export's `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct NewsRow {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Source", default)]
    source: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Url", default)]
    url: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Ticker", default)]
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct ScreenerRow {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "News URL", default)]
    news_url: String,
}

/// Parse a news export body. Rows without a URL are dropped.
pub fn parse_news(body: &str) -> Result<Vec<Headline>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut headlines = Vec::new();
    for row in reader.deserialize::<NewsRow>() {
        let row = row?;
        if row.url.is_empty() {
            continue;
        }
        headlines.push(Headline {
            published_at: NaiveDateTime::parse_from_str(&row.date, DATE_FORMAT).ok(),
            title: row.title,
            source: row.source,
            url: row.url,
            category: row.category,
            ticker: normalize_ticker(&row.ticker),
        });
    }
    Ok(headlines)
}

/// Parse a screener export into upper-case ticker -> latest news link.
/// Tickers with an empty link are left out.
pub fn parse_latest_links(body: &str) -> Result<HashMap<String, String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut links = HashMap::new();
    for row in reader.deserialize::<ScreenerRow>() {
        let row = row?;
        if !row.news_url.is_empty() {
            links.insert(normalize_ticker(&row.ticker), row.news_url);
        }
    }
    Ok(links)
}
