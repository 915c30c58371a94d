use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const NOT_FOUND: &str = "Not found";

static RECOMMENDATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(BUY|SELL)\b").expect("Invalid regex pattern"));
static SENTIMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Sentiment analysis:?(.*?)Price analysis:").expect("Invalid regex pattern"));
static REASONING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Reasoning:?(.*)").expect("Invalid regex pattern"));

/// Fields pulled out of a free-text model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPrediction {
    pub recommendation: String,
    pub sentiment: String,
    pub reasoning: String,
}

/// Markdown emphasis and whitespace around a captured section.
fn clean_section(section: &str) -> String {
    section.trim_matches(|c: char| c.is_whitespace() || c == '*').to_string()
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_section(m.as_str()))
        .filter(|section| !section.is_empty())
}

pub fn parse_prediction(text: &str) -> ParsedPrediction {
    let recommendation = RECOMMENDATION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    ParsedPrediction {
        recommendation,
        sentiment: capture(&SENTIMENT_RE, text).unwrap_or_else(|| NOT_FOUND.to_string()),
        reasoning: capture(&REASONING_RE, text).unwrap_or_else(|| NOT_FOUND.to_string()),
    }
}
