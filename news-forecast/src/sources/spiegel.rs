use crate::extract::{join_blocks, parse_selector, select_texts};
use crate::fetcher::HttpFetch;
use crate::recency::{parse_unix_timestamp, RecencyFilter};
use crate::sources::discovery::{collect_pages, resolve_texts, DiscoveredPage, RecordSet, SearchHit};
use crate::traits::NewsSource;
use crate::types::{ArticleText, ForecastError, Result, RetrievalRequest};
use async_trait::async_trait;
use scraper::Selector;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const SPIEGEL_SEARCH_URL: &str = "https://www.spiegel.de/services/sitesearch/search";
pub const ARTICLE_TEXT_SELECTOR: &str = r#"div[data-area="text"] p"#;

const PAGE_SIZE: u32 = 10;
const DEFAULT_PAGE_LIMIT: u32 = 5;
const SEARCH_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];
const ARTICLE_HEADERS: [(&str, &str); 1] = [("Accept", "text/html")];

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    publish_date: Option<serde_json::Value>,
    #[serde(default)]
    access_level: Option<String>,
}

/// SPIEGEL site search. Only free articles are kept; the body is scraped from
/// the article page.
pub struct SpiegelSource {
    http: Arc<dyn HttpFetch>,
    search_url: String,
    page_limit: u32,
    text_selector: String,
}

impl SpiegelSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            search_url: SPIEGEL_SEARCH_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            text_selector: ARTICLE_TEXT_SELECTOR.to_string(),
        }
    }

    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn with_text_selector(mut self, text_selector: impl Into<String>) -> Self {
        self.text_selector = text_selector.into();
        self
    }

    pub fn parse_search_page(payload: serde_json::Value) -> Result<DiscoveredPage> {
        let response: SearchResponse = serde_json::from_value(payload)?;
        let result_count = response.results.len();
        let hits = response
            .results
            .into_iter()
            .filter(|result| result.access_level.as_deref() == Some("free"))
            .filter_map(|result| {
                let identifier = result.url?;
                let raw_date = result.publish_date?;
                Some(SearchHit {
                    identifier,
                    published_at: parse_unix_timestamp(&raw_date),
                })
            })
            .collect();

        Ok(DiscoveredPage { result_count, hits })
    }

    /// Article paragraphs matched by `selector`, joined in document order.
    pub fn extract_article_text(html: &str, selector: &Selector) -> String {
        join_blocks(select_texts(html, selector))
    }

    fn configuration_error(&self, reason: String) -> ForecastError {
        ForecastError::adapter_configuration(self.source_name(), reason)
    }

    async fn search_page(&self, base: &Url, company_name: &str, page: u32) -> Result<DiscoveredPage> {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("segments", "spon")
            .append_pair("q", company_name)
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &PAGE_SIZE.to_string());

        let payload = self.http.get_json(&url, &SEARCH_HEADERS).await?;
        Self::parse_search_page(payload)
    }

    async fn fetch_text(&self, identifier: String) -> Result<String> {
        let url = Url::parse(&identifier)?;
        let html = self.http.get_text(&url, &ARTICLE_HEADERS).await?;
        let selector = parse_selector(&self.text_selector)?;
        Ok(Self::extract_article_text(&html, &selector))
    }
}

#[async_trait]
impl NewsSource for SpiegelSource {
    fn source_name(&self) -> String {
        "Spiegel".to_string()
    }

    async fn fetch_articles(&self, request: &RetrievalRequest) -> Result<Vec<ArticleText>> {
        let base = Url::parse(&self.search_url)
            .map_err(|e| self.configuration_error(format!("search url '{}': {}", self.search_url, e)))?;
        parse_selector(&self.text_selector).map_err(|e| self.configuration_error(e.to_string()))?;
        let filter = RecencyFilter::snapshot(request.window);
        let source_name = self.source_name();

        info!("{}: searching for '{}'", source_name, request.company_name);

        let mut records = RecordSet::new();
        collect_pages(
            &mut records,
            &source_name,
            &request.company_name,
            self.page_limit,
            |page| self.search_page(&base, &request.company_name, page),
        )
        .await;
        info!("{}: {} free articles discovered", source_name, records.len());

        let recent = records.retain_recent(&filter);
        info!(
            "{}: {} articles within {} days",
            source_name,
            recent.len(),
            filter.window().days()
        );

        let texts = resolve_texts(&source_name, &recent, |identifier| self.fetch_text(identifier)).await;
        info!("{}: extracted {} article texts", source_name, texts.len());
        Ok(texts)
    }
}
