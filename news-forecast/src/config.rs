use crate::types::{ForecastError, Result};
use chrono::{NaiveDate, Utc};
use std::env;
use tracing::debug;

pub const DEFAULT_HISTORY_DAYS: u32 = 60;
pub const DEFAULT_EVALUATION_OFFSET_DAYS: u32 = 7;
pub const DEFAULT_TIMEFRAMES: [u32; 3] = [2, 7, 14];
/// Upper bound for news windows and history spans.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_base_url: Option<String>,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let gemini_api_key = non_empty("GEMINI_API_KEY")
            .ok_or_else(|| ForecastError::Config("GEMINI_API_KEY is not set".to_string()))?;

        Ok(Self {
            gemini_api_key,
            gemini_base_url: non_empty("GEMINI_BASE_URL"),
            database_url: non_empty("DATABASE_URL"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub name: String,
    pub industry: String,
}

impl Company {
    pub fn new(name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
        }
    }
}

pub fn default_companies() -> Vec<Company> {
    [
        ("Volkswagen", "Automobil"),
        ("Siemens", "Industrie"),
        ("Allianz", "Finanzen"),
        ("Apple", "Technologie"),
        ("Microsoft", "Technologie"),
        ("SAP", "Software"),
        ("Deutsche Bank", "Finanzen"),
        ("Rheinmetall", "Rüstung"),
        ("BMW", "Automobil"),
        ("Adidas", "Konsumgüter"),
    ]
    .into_iter()
    .map(|(name, industry)| Company::new(name, industry))
    .collect()
}

/// The company x timeframe matrix of one batch.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub companies: Vec<Company>,
    pub timeframes: Vec<u32>,
    /// Last day (exclusive) of the price history window.
    pub end_date: NaiveDate,
    pub history_days: u32,
    pub evaluation_offset_days: u32,
    pub concurrent_sources: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            companies: default_companies(),
            timeframes: DEFAULT_TIMEFRAMES.to_vec(),
            end_date: Utc::now().date_naive(),
            history_days: DEFAULT_HISTORY_DAYS,
            evaluation_offset_days: DEFAULT_EVALUATION_OFFSET_DAYS,
            concurrent_sources: false,
        }
    }
}

impl ExperimentConfig {
    /// Keeps only the named companies (case-insensitive). An empty filter
    /// keeps all of them.
    pub fn retain_companies(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.companies.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
        {
            return Err(ForecastError::Config(format!("unknown company '{}'", unknown)));
        }
        self.companies
            .retain(|company| names.iter().any(|name| company.name.eq_ignore_ascii_case(name)));
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.companies.is_empty() {
            return Err(ForecastError::Config("no companies configured".to_string()));
        }
        if self.timeframes.is_empty() || self.timeframes.contains(&0) {
            return Err(ForecastError::Config("timeframes must be positive day counts".to_string()));
        }
        if let Some(days) = self.timeframes.iter().find(|days| **days > MAX_WINDOW_DAYS) {
            return Err(ForecastError::Config(format!(
                "timeframe of {} days exceeds {} days",
                days, MAX_WINDOW_DAYS
            )));
        }
        if self.history_days == 0 || self.history_days > MAX_WINDOW_DAYS {
            return Err(ForecastError::Config(format!(
                "history_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(())
    }
}
