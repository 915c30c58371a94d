use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A search hit discovered by a news source: where the article lives and
/// when it was published.
///
/// The identifier is either an absolute URL or a provider-relative path that
/// the owning source knows how to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub identifier: String,
    pub published_at: DateTime<Utc>,
}

/// Plain-text body of one resolved article.
pub type ArticleText = String;

/// Trailing day window, always evaluated against a caller-captured "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    days: u32,
}

impl TimeWindow {
    /// Returns `None` for a zero-day window.
    pub fn new(days: u32) -> Option<Self> {
        (days > 0).then_some(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Earliest instant still inside the window when evaluated at `now`, or
    /// `None` when the window reaches past the representable range.
    pub fn start_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Duration::try_days(i64::from(self.days)).and_then(|span| now.checked_sub_signed(span))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub company_name: String,
    pub window: TimeWindow,
}

impl RetrievalRequest {
    pub fn new(company_name: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            company_name: company_name.into(),
            window,
        }
    }
}

/// One daily bar of price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Everything one prediction call needs. Built once per experiment cell.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub company_name: String,
    pub articles: Vec<ArticleText>,
    pub price_history: Vec<PricePoint>,
}

/// Flat output row for one experiment cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub batch_id: Uuid,
    pub run_id: u32,
    pub analysis_date: NaiveDate,
    pub company: String,
    pub industry: String,
    pub window_days: u32,
    pub article_count: usize,
    pub price_at_forecast: f64,
    pub price_7_days_prior: Option<f64>,
    pub recommendation: String,
    pub sentiment: String,
    pub reasoning: String,
    pub raw_prediction: String,
    pub snippet: String,
}
