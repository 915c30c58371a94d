use crate::fetcher::HttpFetch;
use crate::traits::MarketData;
use crate::types::{ForecastError, PricePoint, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const CHART_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];

/// Company names of the default experiment matrix and their listings.
const TICKERS: [(&str, &str); 10] = [
    ("Volkswagen", "VOW3.DE"),
    ("Siemens", "SIE.DE"),
    ("Allianz", "ALV.DE"),
    ("Apple", "AAPL"),
    ("Microsoft", "MSFT"),
    ("SAP", "SAP.DE"),
    ("Deutsche Bank", "DBK.DE"),
    ("Rheinmetall", "RHM.DE"),
    ("BMW", "BMW.DE"),
    ("Adidas", "ADS.DE"),
];

pub fn ticker_for(company_name: &str) -> Option<&'static str> {
    let wanted = company_name.trim();
    TICKERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, ticker)| *ticker)
}

/// Close of the last bar dated on or before `date`.
pub fn close_at_or_before(history: &[PricePoint], date: NaiveDate) -> Option<f64> {
    history
        .iter()
        .filter(|point| point.date <= date)
        .max_by_key(|point| point.date)
        .map(|point| point.close)
}

#[derive(Debug, Default, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    chart: ChartBody,
}

#[derive(Debug, Default, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Daily bars from a chart payload. Rows with any missing value are dropped.
pub fn parse_chart(payload: serde_json::Value) -> Result<Vec<PricePoint>> {
    let envelope: ChartEnvelope = serde_json::from_value(payload)?;
    let Some(result) = envelope.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let series = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let row = (|| {
            Some(PricePoint {
                date: DateTime::from_timestamp(*ts, 0)?.date_naive(),
                open: (*series.open.get(i)?)?,
                high: (*series.high.get(i)?)?,
                low: (*series.low.get(i)?)?,
                close: (*series.close.get(i)?)?,
                volume: (*series.volume.get(i)?)?,
            })
        })();
        match row {
            Some(point) => points.push(point),
            None => debug!("Skipping incomplete bar at {}", ts),
        }
    }
    points.sort_by_key(|point| point.date);
    Ok(points)
}

/// Yahoo Finance chart API.
pub struct YahooMarketData {
    http: Arc<dyn HttpFetch>,
    chart_url: String,
}

impl YahooMarketData {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            chart_url: YAHOO_CHART_URL.to_string(),
        }
    }

    pub fn with_chart_url(mut self, chart_url: impl Into<String>) -> Self {
        self.chart_url = chart_url.into();
        self
    }
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn get_history(
        &self,
        company_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<PricePoint>>> {
        let Some(ticker) = ticker_for(company_name) else {
            warn!("No ticker known for {}", company_name);
            return Ok(None);
        };

        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let period2 = end.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(ForecastError::General(format!("invalid date range {} .. {}", start, end)));
        };

        let mut url = Url::parse(&format!("{}/{}", self.chart_url.trim_end_matches('/'), ticker))?;
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d");

        debug!("Fetching {} history for {} from {} to {}", ticker, company_name, start, end);
        let payload = self.http.get_json(&url, &CHART_HEADERS).await?;
        let history: Vec<PricePoint> = parse_chart(payload)?
            .into_iter()
            .filter(|point| point.date >= start && point.date < end)
            .collect();

        if history.is_empty() {
            warn!("No price data for {} ({})", company_name, ticker);
            return Ok(None);
        }
        Ok(Some(history))
    }
}
