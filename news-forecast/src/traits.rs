use crate::types::{ArticleText, ExperimentRecord, PricePoint, Result, RetrievalRequest};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Capability shared by every news provider: turn a company name and a
/// recency window into the plain text of matching articles.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Human-readable name used in logs
    fn source_name(&self) -> String;

    /// Fetch the text of recent articles about `request.company_name`.
    ///
    /// Individual page and article failures are absorbed and only shrink the
    /// result. An error is returned only when the source itself is
    /// misconfigured.
    async fn fetch_articles(&self, request: &RetrievalRequest) -> Result<Vec<ArticleText>>;
}

/// Daily price history provider.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Ordered daily bars in `[start, end)`, or `None` when the company is
    /// unknown or the provider has no data for it.
    async fn get_history(
        &self,
        company_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<PricePoint>>>;
}

/// Append-only destination for experiment rows.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: &ExperimentRecord) -> Result<()>;
}
