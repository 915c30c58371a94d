use crate::extract::{html_to_text, join_blocks};
use crate::fetcher::HttpFetch;
use crate::recency::{parse_iso_timestamp, RecencyFilter};
use crate::sources::discovery::{collect_pages, resolve_texts, DiscoveredPage, RecordSet, SearchHit};
use crate::traits::NewsSource;
use crate::types::{ArticleText, ForecastError, Result, RetrievalRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const TAGESSCHAU_SEARCH_URL: &str = "https://www.tagesschau.de/api2u/search/";

/// Extra terms combined with the company name to widen recall.
pub const SEARCH_KEYWORDS: [&str; 9] = [
    "Aktie",
    "Bilanz",
    "Quartalszahlen",
    "Geschäftszahlen",
    "Gewinnwarnung",
    "Ausblick",
    "Prognose",
    "Vorstand",
    "Übernahme",
];

const PAGE_SIZE: u32 = 30;
const DEFAULT_PAGE_LIMIT: u32 = 3;

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "searchResults")]
    search_results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    date: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// ARD Tagesschau search API. Runs one query for the bare company name and one
/// per keyword; each hit points to a JSON document with the article body.
pub struct TagesschauSource {
    http: Arc<dyn HttpFetch>,
    search_url: String,
    page_limit: u32,
}

impl TagesschauSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            search_url: TAGESSCHAU_SEARCH_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
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

    /// Exact-phrase queries: the company alone, then company plus each keyword.
    pub fn search_terms(company_name: &str) -> Vec<String> {
        let mut terms = vec![format!("\"{}\"", company_name)];
        terms.extend(
            SEARCH_KEYWORDS
                .iter()
                .map(|keyword| format!("\"{}\" \"{}\"", company_name, keyword)),
        );
        terms
    }

    pub fn parse_search_page(payload: serde_json::Value) -> Result<DiscoveredPage> {
        let response: SearchResponse = serde_json::from_value(payload)?;
        let result_count = response.search_results.len();
        let hits = response
            .search_results
            .into_iter()
            .filter_map(|result| {
                let identifier = result.details?;
                let raw_date = result.date?;
                Some(SearchHit {
                    identifier,
                    published_at: raw_date.as_str().and_then(parse_iso_timestamp),
                })
            })
            .collect();

        Ok(DiscoveredPage { result_count, hits })
    }

    /// Text blocks of an article document, markup stripped.
    pub fn extract_article_text(payload: serde_json::Value) -> Result<String> {
        let article: ArticleResponse = serde_json::from_value(payload)?;
        let blocks = article
            .content
            .iter()
            .filter(|block| block.kind.as_deref() == Some("text"))
            .filter_map(|block| block.value.as_ref().and_then(|value| value.as_str()))
            .map(html_to_text);

        Ok(join_blocks(blocks))
    }

    fn base_url(&self) -> Result<Url> {
        Url::parse(&self.search_url).map_err(|e| {
            ForecastError::adapter_configuration(self.source_name(), format!("search url '{}': {}", self.search_url, e))
        })
    }

    async fn search_page(&self, base: &Url, term: &str, page: u32) -> Result<DiscoveredPage> {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("searchText", term)
            .append_pair("resultPage", &page.to_string())
            .append_pair("pageSize", &PAGE_SIZE.to_string());

        let payload = self.http.get_json(&url, &[]).await?;
        Self::parse_search_page(payload)
    }

    async fn fetch_text(&self, identifier: String) -> Result<String> {
        let url = Url::parse(&identifier)?;
        let payload = self.http.get_json(&url, &[]).await?;
        Self::extract_article_text(payload)
    }
}

#[async_trait]
impl NewsSource for TagesschauSource {
    fn source_name(&self) -> String {
        "Tagesschau".to_string()
    }

    async fn fetch_articles(&self, request: &RetrievalRequest) -> Result<Vec<ArticleText>> {
        let base = self.base_url()?;
        let filter = RecencyFilter::snapshot(request.window);
        let source_name = self.source_name();

        info!("{}: searching for '{}'", source_name, request.company_name);

        let mut records = RecordSet::new();
        for term in Self::search_terms(&request.company_name) {
            collect_pages(&mut records, &source_name, &term, self.page_limit, |page| {
                self.search_page(&base, &term, page)
            })
            .await;
        }
        info!("{}: {} unique articles discovered", source_name, records.len());

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
