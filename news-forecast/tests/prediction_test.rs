use news_forecast::parse_prediction;
use news_forecast::prediction::NOT_FOUND;

const ANSWER: &str = r#"**Sentiment analysis:**
The news flow is mostly positive: strong quarterly results and a raised outlook.

**Price analysis:**
The share has climbed steadily over the last week.

**Forecast:**
Slight further gains over the next 5 trading days.

**Recommendation:** **Buy**

**Reasoning:**
Robust earnings and positive momentum outweigh short-term risks.
"#;

#[test]
fn parses_all_sections() {
    let parsed = parse_prediction(ANSWER);

    assert_eq!(parsed.recommendation, "BUY");
    assert_eq!(
        parsed.sentiment,
        "The news flow is mostly positive: strong quarterly results and a raised outlook."
    );
    assert_eq!(
        parsed.reasoning,
        "Robust earnings and positive momentum outweigh short-term risks."
    );
}

#[test]
fn first_recommendation_word_wins() {
    let parsed = parse_prediction("Recommendation: SELL. Some would buy, but not us.");
    assert_eq!(parsed.recommendation, "SELL");
}

#[test]
fn missing_sections_are_reported_as_not_found() {
    let parsed = parse_prediction("Sentiment analysis: cautious. Recommendation: sell");

    assert_eq!(parsed.recommendation, "SELL");
    assert_eq!(parsed.sentiment, NOT_FOUND);
    assert_eq!(parsed.reasoning, NOT_FOUND);
}

#[test]
fn headings_are_case_insensitive() {
    let parsed = parse_prediction("SENTIMENT ANALYSIS neutral PRICE ANALYSIS: flat\nREASONING: nothing new");

    assert_eq!(parsed.sentiment, "neutral");
    assert_eq!(parsed.reasoning, "nothing new");
    assert_eq!(parsed.recommendation, NOT_FOUND);
}
