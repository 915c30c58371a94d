use crate::traits::NewsSource;
use crate::types::{ArticleText, Result, RetrievalRequest};
use futures::future::join_all;
use tracing::{error, info};

/// Fans a retrieval request out to every configured source and concatenates
/// what comes back. A failing source contributes nothing; it never fails the
/// whole call.
pub struct NewsAggregator {
    sources: Vec<Box<dyn NewsSource>>,
    concurrent: bool,
}

impl NewsAggregator {
    pub fn new(sources: Vec<Box<dyn NewsSource>>) -> Self {
        Self {
            sources,
            concurrent: false,
        }
    }

    /// Poll all sources at once. Output order stays source order.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn add_source(&mut self, source: Box<dyn NewsSource>) {
        info!("Adding news source: {}", source.source_name());
        self.sources.push(source);
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.source_name()).collect()
    }

    /// Articles from every source, in source order then discovery order.
    /// Duplicates across sources are kept.
    pub async fn fetch_all(&self, request: &RetrievalRequest) -> Vec<ArticleText> {
        info!(
            "Fetching articles for '{}' ({} days) from {} sources",
            request.company_name,
            request.window.days(),
            self.sources.len()
        );

        let results = if self.concurrent {
            join_all(self.sources.iter().map(|source| source.fetch_articles(request))).await
        } else {
            let mut results = Vec::with_capacity(self.sources.len());
            for source in &self.sources {
                results.push(source.fetch_articles(request).await);
            }
            results
        };

        let articles = self.merge(results);
        info!("Collected {} articles for '{}'", articles.len(), request.company_name);
        articles
    }

    fn merge(&self, results: Vec<Result<Vec<ArticleText>>>) -> Vec<ArticleText> {
        let mut articles = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(texts) => {
                    info!("{}: contributed {} articles", source.source_name(), texts.len());
                    articles.extend(texts);
                }
                Err(e) => {
                    error!("Error from source {}: {}", source.source_name(), e);
                }
            }
        }
        articles
    }
}
