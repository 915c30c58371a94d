mod common;

use common::{init_tracing, FailingSource, StaticSource};
use news_forecast::{NewsAggregator, RetrievalRequest, TimeWindow};
use std::time::Duration;

fn adidas_week() -> RetrievalRequest {
    RetrievalRequest::new("Adidas", TimeWindow::new(7).unwrap())
}

#[tokio::test]
async fn failing_source_contributes_nothing() {
    init_tracing();
    let aggregator = NewsAggregator::new(vec![
        Box::new(StaticSource::new("Tagesschau", &["t1", "t2"])),
        Box::new(FailingSource),
        Box::new(StaticSource::new("Handelsblatt", &["h1"])),
    ]);

    let articles = aggregator.fetch_all(&adidas_week()).await;
    assert_eq!(articles, vec!["t1", "t2", "h1"]);
}

#[tokio::test]
async fn duplicates_across_sources_are_kept() {
    let aggregator = NewsAggregator::new(vec![
        Box::new(StaticSource::new("A", &["same"])),
        Box::new(StaticSource::new("B", &["same"])),
    ]);

    assert_eq!(aggregator.fetch_all(&adidas_week()).await, vec!["same", "same"]);
}

#[tokio::test]
async fn all_sources_failing_yields_empty() {
    let aggregator = NewsAggregator::new(vec![Box::new(FailingSource), Box::new(FailingSource)]);
    assert!(aggregator.fetch_all(&adidas_week()).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_mode_keeps_source_order() {
    init_tracing();
    let mut aggregator = NewsAggregator::new(vec![Box::new(
        StaticSource::new("Slow", &["slow"]).with_delay(Duration::from_secs(5)),
    )])
    .with_concurrency(true);
    aggregator.add_source(Box::new(FailingSource));
    aggregator.add_source(Box::new(StaticSource::new("Fast", &["fast"])));

    assert_eq!(aggregator.source_names(), vec!["Slow", "Failing", "Fast"]);
    assert_eq!(aggregator.fetch_all(&adidas_week()).await, vec!["slow", "fast"]);
}
