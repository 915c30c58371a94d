use crate::extract::{collapse_whitespace, html_to_text, join_blocks};
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

pub const HANDELSBLATT_SEARCH_URL: &str = "https://content.www.handelsblatt.com/api/search/site/";
pub const HANDELSBLATT_CONTENT_URL: &str = "https://content.www.handelsblatt.com/api/content/eager/";

const DEFAULT_PAGE_LIMIT: u32 = 5;
const FREE_ACCESS_CATEGORY: &str = "NONE";
const PARAGRAPH_ELEMENT: &str = "paragraphStorylineElement";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    teasers: Vec<Teaser>,
}

#[derive(Debug, Deserialize)]
struct Teaser {
    #[serde(default, rename = "contentAccessCategory")]
    content_access_category: Option<String>,
    #[serde(default)]
    url: Option<TeaserUrl>,
    #[serde(default)]
    dates: Option<TeaserDates>,
}

#[derive(Debug, Deserialize)]
struct TeaserUrl {
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeaserDates {
    #[serde(default)]
    published: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    header: Option<ContentHeader>,
    #[serde(default)]
    elements: Vec<ContentElement>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentHeader {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default, rename = "leadText")]
    lead_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentElement {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Option<ElementData>,
}

#[derive(Debug, Deserialize)]
struct ElementData {
    #[serde(default)]
    text: Option<String>,
}

/// Handelsblatt site search. Hits carry site-relative paths which the content
/// API resolves into headline, lead and storyline paragraphs.
pub struct HandelsblattSource {
    http: Arc<dyn HttpFetch>,
    search_url: String,
    content_url: String,
    page_limit: u32,
}

impl HandelsblattSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            search_url: HANDELSBLATT_SEARCH_URL.to_string(),
            content_url: HANDELSBLATT_CONTENT_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    pub fn with_content_url(mut self, content_url: impl Into<String>) -> Self {
        self.content_url = content_url.into();
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn parse_search_page(payload: serde_json::Value) -> Result<DiscoveredPage> {
        let response: SearchResponse = serde_json::from_value(payload)?;
        let result_count = response.teasers.len();
        let hits = response
            .teasers
            .into_iter()
            .filter(|teaser| teaser.content_access_category.as_deref() == Some(FREE_ACCESS_CATEGORY))
            .filter_map(|teaser| {
                let identifier = teaser.url?.href?;
                let raw_date = teaser.dates?.published?;
                Some(SearchHit {
                    identifier,
                    published_at: raw_date.as_str().and_then(parse_iso_timestamp),
                })
            })
            .collect();

        Ok(DiscoveredPage { result_count, hits })
    }

    /// Headline and lead first, then every storyline paragraph.
    pub fn extract_article_text(payload: serde_json::Value) -> Result<String> {
        let content: ContentResponse = serde_json::from_value(payload)?;

        let mut blocks = Vec::new();
        if let Some(header) = content.header {
            blocks.extend(header.headline.as_deref().map(collapse_whitespace));
            blocks.extend(header.lead_text.as_deref().map(collapse_whitespace));
        }
        blocks.extend(
            content
                .elements
                .iter()
                .filter(|element| element.kind.as_deref() == Some(PARAGRAPH_ELEMENT))
                .filter_map(|element| element.data.as_ref().and_then(|data| data.text.as_deref()))
                .map(html_to_text),
        );

        Ok(join_blocks(blocks))
    }

    fn parse_configured_url(&self, label: &str, raw: &str) -> Result<Url> {
        Url::parse(raw).map_err(|e| {
            ForecastError::adapter_configuration(self.source_name(), format!("{} url '{}': {}", label, raw, e))
        })
    }

    async fn search_page(&self, base: &Url, company_name: &str, page: u32) -> Result<DiscoveredPage> {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("searchTerm", company_name)
            .append_pair("page", &page.to_string());

        let payload = self.http.get_json(&url, &[]).await?;
        Self::parse_search_page(payload)
    }

    async fn fetch_text(&self, content_base: &Url, path: String) -> Result<String> {
        let mut url = content_base.clone();
        url.query_pairs_mut().append_pair("url", &path);

        let payload = self.http.get_json(&url, &[]).await?;
        Self::extract_article_text(payload)
    }
}

#[async_trait]
impl NewsSource for HandelsblattSource {
    fn source_name(&self) -> String {
        "Handelsblatt".to_string()
    }

    async fn fetch_articles(&self, request: &RetrievalRequest) -> Result<Vec<ArticleText>> {
        let search_base = self.parse_configured_url("search", &self.search_url)?;
        let content_base = self.parse_configured_url("content", &self.content_url)?;
        let filter = RecencyFilter::snapshot(request.window);
        let source_name = self.source_name();

        info!("{}: searching for '{}'", source_name, request.company_name);

        let mut records = RecordSet::new();
        collect_pages(
            &mut records,
            &source_name,
            &request.company_name,
            self.page_limit,
            |page| self.search_page(&search_base, &request.company_name, page),
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

        let texts = resolve_texts(&source_name, &recent, |path| self.fetch_text(&content_base, path)).await;
        info!("{}: extracted {} article texts", source_name, texts.len());
        Ok(texts)
    }
}
