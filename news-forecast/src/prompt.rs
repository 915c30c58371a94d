//! Renders articles and price history into the single prediction prompt.

use crate::types::{ArticleText, PredictionRequest, PricePoint};
use tracing::warn;

/// Character budget for the concatenated news block.
pub const MAX_NEWS_CHARS: usize = 25_000;
pub const ARTICLE_SEPARATOR: &str = "\n\n---\n\n";
pub const TRUNCATION_MARKER: &str = "\n\n... [NOTE: news articles were truncated for analysis] ...";

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[derive(Debug, Clone)]
pub struct PromptCompiler {
    max_news_chars: usize,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self {
            max_news_chars: MAX_NEWS_CHARS,
        }
    }
}

impl PromptCompiler {
    pub fn new(max_news_chars: usize) -> Self {
        Self { max_news_chars }
    }

    pub fn max_news_chars(&self) -> usize {
        self.max_news_chars
    }

    /// Articles joined by the separator, cut to the budget with a visible
    /// marker when too long.
    pub fn format_news(&self, articles: &[ArticleText]) -> String {
        let joined = articles.join(ARTICLE_SEPARATOR);
        let kept = truncate_chars(&joined, self.max_news_chars);
        if kept.len() == joined.len() {
            return joined;
        }

        warn!(
            "News block truncated from {} to {} characters",
            joined.chars().count(),
            self.max_news_chars
        );
        let mut truncated = String::with_capacity(kept.len() + TRUNCATION_MARKER.len());
        truncated.push_str(kept);
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }

    /// Column-aligned table, one row per trading day, oldest first.
    pub fn format_price_table(history: &[PricePoint]) -> String {
        let header = ["", "Date", "Open", "High", "Low", "Close", "Volume"];
        let rows: Vec<[String; 7]> = history
            .iter()
            .enumerate()
            .map(|(index, point)| {
                [
                    index.to_string(),
                    point.date.format("%Y-%m-%d").to_string(),
                    format!("{:.2}", point.open),
                    format!("{:.2}", point.high),
                    format!("{:.2}", point.low),
                    format!("{:.2}", point.close),
                    point.volume.to_string(),
                ]
            })
            .collect();

        let mut widths = header.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let render = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(render(header.to_vec()));
        for row in &rows {
            lines.push(render(row.iter().map(String::as_str).collect()));
        }
        lines.join("\n")
    }

    pub fn compile(&self, request: &PredictionRequest) -> String {
        let news = self.format_news(&request.articles);
        let history = Self::format_price_table(&request.price_history);
        let trading_days = request.price_history.len();

        format!(
            r#"**Assignment: stock price forecast**

**Company:** {company}

**Basis for the analysis:**
Below you receive current news articles and the share price development of the last {days} trading days for the company named above. Analyse this information as a financial expert.

**Tasks:**
1. **Sentiment analysis:** Analyse the tone and content of the news. Are they mainly positive, negative or neutral? Are there important announcements (e.g. quarterly results, new products, litigation)?
2. **Price analysis:** Assess the price history so far. Is there a clear trend?
3. **Forecast:** Based on your analysis, forecast the share price for the **next 5 trading days**.
4. **Recommendation:** Give a clear and concise recommendation. You must choose exactly one of the two options: **BUY or SELL**.
5. **Reasoning:** Summarise the most important reasons for your recommendation in 2-3 sentences.

Use the headings "Sentiment analysis:", "Price analysis:", "Forecast:", "Recommendation:" and "Reasoning:" in your answer.

**The data:**

**1. Current news articles:**
---
{news}
---

**2. Share price history of the last {days} trading days:**
---
{history}
---

**Please output your complete analysis now.**
"#,
            company = request.company_name,
            days = trading_days,
            news = news,
            history = history,
        )
    }
}
