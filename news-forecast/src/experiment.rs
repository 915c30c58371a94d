use crate::aggregator::NewsAggregator;
use crate::config::{Company, ExperimentConfig};
use crate::market_data::close_at_or_before;
use crate::prediction::parse_prediction;
use crate::retry::ResilientClient;
use crate::traits::{MarketData, ResultSink};
use crate::types::{ArticleText, ExperimentRecord, PredictionRequest, PricePoint, RetrievalRequest, TimeWindow};
use chrono::Duration;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SNIPPET_CHARS: usize = 500;

/// First characters of all articles joined by a space, always followed by
/// an ellipsis.
pub fn article_snippet(articles: &[ArticleText]) -> String {
    let joined = articles.join(" ");
    let mut snippet: String = joined.chars().take(SNIPPET_CHARS).collect();
    snippet.push_str("...");
    snippet
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: u32,
    pub skipped: u32,
    pub sink_failures: u32,
}

/// Runs one batch over the company x timeframe matrix.
pub struct ExperimentRunner {
    config: ExperimentConfig,
    aggregator: NewsAggregator,
    market_data: Arc<dyn MarketData>,
    client: ResilientClient,
    sink: Arc<dyn ResultSink>,
    batch_id: Uuid,
}

impl ExperimentRunner {
    pub fn new(
        config: ExperimentConfig,
        aggregator: NewsAggregator,
        market_data: Arc<dyn MarketData>,
        client: ResilientClient,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            config,
            aggregator,
            market_data,
            client,
            sink,
            batch_id: Uuid::new_v4(),
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub async fn run(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut run_id: u32 = 1;

        info!(
            "Starting batch {}: {} companies x {} timeframes",
            self.batch_id,
            self.config.companies.len(),
            self.config.timeframes.len()
        );

        for company in &self.config.companies {
            for &days in &self.config.timeframes {
                info!(
                    "--- Run {}: {} ({}) with {}-day news ---",
                    run_id, company.name, company.industry, days
                );

                match self.run_cell(run_id, company, days).await {
                    Some(record) => {
                        summary.completed += 1;
                        if let Err(e) = self.sink.append(&record).await {
                            error!("Failed to store run {}: {}", run_id, e);
                            summary.sink_failures += 1;
                        }
                    }
                    None => summary.skipped += 1,
                }
                run_id += 1;
            }
        }

        info!(
            "Batch {} finished: {} completed, {} skipped, {} sink failures",
            self.batch_id, summary.completed, summary.skipped, summary.sink_failures
        );
        summary
    }

    async fn run_cell(&self, run_id: u32, company: &Company, days: u32) -> Option<ExperimentRecord> {
        let Some(window) = TimeWindow::new(days) else {
            warn!("Run {}: zero-day window, skipping", run_id);
            return None;
        };

        let request = RetrievalRequest::new(company.name.clone(), window);
        let articles = self.aggregator.fetch_all(&request).await;

        let history = self.load_history(&company.name).await?;
        let last = history.last()?;
        let price_at_forecast = last.close;
        let reference_date = Duration::try_days(i64::from(self.config.evaluation_offset_days))
            .and_then(|offset| last.date.checked_sub_signed(offset));
        let price_7_days_prior = reference_date.and_then(|date| close_at_or_before(&history, date));
        if price_7_days_prior.is_none() {
            warn!(
                "Not enough history for {} to price {} days before {}",
                company.name, self.config.evaluation_offset_days, last.date
            );
        }

        let tail_start = history.len().saturating_sub(days as usize);
        let prediction_request = PredictionRequest {
            company_name: company.name.clone(),
            articles,
            price_history: history[tail_start..].to_vec(),
        };
        let raw_prediction = self.client.predict(&prediction_request).await;
        let parsed = parse_prediction(&raw_prediction);

        Some(ExperimentRecord {
            batch_id: self.batch_id,
            run_id,
            analysis_date: self.config.end_date,
            company: company.name.clone(),
            industry: company.industry.clone(),
            window_days: days,
            article_count: prediction_request.articles.len(),
            price_at_forecast,
            price_7_days_prior,
            recommendation: parsed.recommendation,
            sentiment: parsed.sentiment,
            reasoning: parsed.reasoning,
            raw_prediction,
            snippet: article_snippet(&prediction_request.articles),
        })
    }

    async fn load_history(&self, company_name: &str) -> Option<Vec<PricePoint>> {
        let end = self.config.end_date;
        let Some(start) = Duration::try_days(i64::from(self.config.history_days))
            .and_then(|span| end.checked_sub_signed(span))
        else {
            error!("History of {} days before {} is out of range, skipping run", self.config.history_days, end);
            return None;
        };

        match self.market_data.get_history(company_name, start, end).await {
            Ok(Some(history)) if !history.is_empty() => Some(history),
            Ok(_) => {
                error!("No market data for {}, skipping run", company_name);
                None
            }
            Err(e) => {
                error!("Market data for {} failed: {}, skipping run", company_name, e);
                None
            }
        }
    }
}
