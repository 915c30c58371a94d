//! Building blocks shared by the source implementations: the identifier-keyed
//! record set, the paginated query loop and the per-article text resolution.

use crate::recency::RecencyFilter;
use crate::types::{ArticleRecord, ArticleText, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

/// One search hit as reported by a provider. `published_at` is `None` when the
/// provider's timestamp could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub identifier: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of search results. `result_count` counts every raw result on the
/// page, including ones filtered out of `hits` (paywalled, incomplete), so an
/// all-filtered page does not end pagination.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredPage {
    pub result_count: usize,
    pub hits: Vec<SearchHit>,
}

/// Discovered records keyed by identifier, kept in first-seen order.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<ArticleRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hit. A repeated identifier keeps its original position and takes
    /// the latest hit's timestamp when that one parsed. Returns `true` if a new
    /// record was created.
    pub fn insert(&mut self, hit: SearchHit) -> bool {
        let Some(published_at) = hit.published_at else {
            if !self.index.contains_key(&hit.identifier) {
                debug!("Dropping {} with unparseable date", hit.identifier);
            }
            return false;
        };

        if let Some(&position) = self.index.get(&hit.identifier) {
            self.records[position].published_at = published_at;
            return false;
        }

        self.index.insert(hit.identifier.clone(), self.records.len());
        self.records.push(ArticleRecord {
            identifier: hit.identifier,
            published_at,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// Records inside the filter's window, in discovery order.
    pub fn retain_recent(self, filter: &RecencyFilter) -> Vec<ArticleRecord> {
        self.records
            .into_iter()
            .filter(|record| filter.admits(record.published_at))
            .collect()
    }
}

/// Runs one paginated query, pages `1..=page_limit`, stopping at the first empty
/// page. A failing page ends this query only; hits gathered so far are kept.
pub async fn collect_pages<F, Fut>(
    records: &mut RecordSet,
    source_name: &str,
    query: &str,
    page_limit: u32,
    mut fetch_page: F,
) where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<DiscoveredPage>>,
{
    for page in 1..=page_limit {
        let discovered = match fetch_page(page).await {
            Ok(discovered) => discovered,
            Err(e) => {
                warn!("{}: search for '{}' failed on page {}: {}", source_name, query, page, e);
                break;
            }
        };

        if discovered.result_count == 0 {
            debug!("{}: no more results for '{}' after page {}", source_name, query, page - 1);
            break;
        }

        for hit in discovered.hits {
            records.insert(hit);
        }
    }
}

/// Resolves each record into text, one request per record. Failures and empty
/// extractions are logged and skipped.
pub async fn resolve_texts<F, Fut>(source_name: &str, records: &[ArticleRecord], mut resolve: F) -> Vec<ArticleText>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut texts = Vec::with_capacity(records.len());
    for record in records {
        match resolve(record.identifier.clone()).await {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => debug!("{}: no text extracted from {}", source_name, record.identifier),
            Err(e) => warn!("{}: failed to fetch article {}: {}", source_name, record.identifier, e),
        }
    }
    texts
}
