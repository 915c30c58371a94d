//! Markup-to-text helpers shared by the news sources.

use crate::types::{ForecastError, Result};
use scraper::{Html, Selector};

/// Separator between extracted content blocks of one article.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Extract clean text content from an HTML fragment
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let raw: String = fragment.root_element().text().collect();
    collapse_whitespace(&raw)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ForecastError::Parse(format!("invalid selector '{}': {:?}", css, e)))
}

/// Text of every element matching `selector`, in document order.
pub fn select_texts(document: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(document);
    document
        .select(selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .collect()
}

/// Joins content blocks with the paragraph separator, skipping empty ones.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blocks
        .into_iter()
        .filter(|block| !block.as_ref().trim().is_empty())
        .map(|block| block.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}
