//! HTTP importer for the Finviz news and screener CSV exports.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::{FeedConfig, FeedKind};
use crate::core::{normalize_ticker, Headline, Importer, SchedulerError};

use super::wire;

const SCREENER: &str = "screener";

/// Importer backed by Finviz CSV exports.
#[derive(Debug, Clone)]
pub struct FinvizImporter {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    kind: FeedKind,
    screener_query: String,
}

impl FinvizImporter {
    /// Build an importer from feed settings.
    pub fn new(cfg: &FeedConfig) -> Result<Self, SchedulerError> {
        let mut base = cfg.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| SchedulerError::InvalidConfiguration(format!("feed base_url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| SchedulerError::InvalidConfiguration(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone(),
            kind: cfg.kind,
            screener_query: cfg.screener_query.clone(),
        })
    }

    /// News export URL for `ticker`.
    pub fn news_url(&self, ticker: &str) -> Result<Url, SchedulerError> {
        let mut url = self
            .base_url
            .join("news_export.ashx")
            .map_err(|e| SchedulerError::fetch(ticker, e))?;
        url.query_pairs_mut()
            .append_pair("v", &self.kind.view().to_string())
            .append_pair("t", &normalize_ticker(ticker))
            .append_pair("auth", &self.api_key);
        Ok(url)
    }

    /// Screener export URL.
    pub fn screener_url(&self) -> Result<Url, SchedulerError> {
        let mut url = self
            .base_url
            .join("export.ashx")
            .map_err(|e| SchedulerError::fetch(SCREENER, e))?;
        url.set_query(Some(&self.screener_query));
        url.query_pairs_mut().append_pair("auth", &self.api_key);
        Ok(url)
    }

    async fn get_text(&self, url: Url, label: &str) -> Result<String, SchedulerError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SchedulerError::fetch(label, e.without_url()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SchedulerError::fetch(label, format!("http status {status}")));
        }
        resp.text()
            .await
            .map_err(|e| SchedulerError::fetch(label, e.without_url()))
    }
}

#[async_trait]
impl Importer for FinvizImporter {
    async fn fetch(&self, ticker: &str) -> Result<Vec<Headline>, SchedulerError> {
        let body = self.get_text(self.news_url(ticker)?, ticker).await?;
        let mut headlines =
            wire::parse_news(&body).map_err(|e| SchedulerError::fetch(ticker, e))?;
        // Single-ticker exports may omit the Ticker column.
        for headline in headlines.iter_mut().filter(|h| h.ticker.is_empty()) {
            headline.ticker = normalize_ticker(ticker);
        }
        debug!(%ticker, rows = headlines.len(), "news export fetched");
        Ok(headlines)
    }

    async fn latest_links(&self) -> Result<HashMap<String, String>, SchedulerError> {
        let body = self.get_text(self.screener_url()?, SCREENER).await?;
        let links =
            wire::parse_latest_links(&body).map_err(|e| SchedulerError::fetch(SCREENER, e))?;
        debug!(tickers = links.len(), "screener export fetched");
        Ok(links)
    }
}
