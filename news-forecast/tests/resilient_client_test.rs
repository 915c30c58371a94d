mod common;

use async_trait::async_trait;
use common::{init_tracing, overloaded, rejected, RecordingSleeper, ScriptedGeneration};
use news_forecast::generation::{GenerationApi, GenerationError};
use news_forecast::retry::{
    failure_sentinel, timeout_sentinel, SleepReason, TokioSleeper, NO_ARTICLES_SENTINEL, OVERLOAD_BACKOFF,
    PACING_DELAY,
};
use news_forecast::{PredictionRequest, ResilientClient, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn request(articles: &[&str]) -> PredictionRequest {
    PredictionRequest {
        company_name: "SAP".to_string(),
        articles: articles.iter().map(|a| a.to_string()).collect(),
        price_history: Vec::new(),
    }
}

#[tokio::test]
async fn overload_is_retried_until_success() {
    init_tracing();
    let api = Arc::new(ScriptedGeneration::new(vec![
        Err(overloaded()),
        Err(overloaded()),
        Err(overloaded()),
        Ok("Recommendation: BUY".to_string()),
    ]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(api.clone()).with_sleeper(sleeper.clone());

    let answer = client.predict(&request(&["news"])).await;

    assert_eq!(answer, "Recommendation: BUY");
    assert_eq!(api.calls(), 4);
    assert_eq!(
        sleeper.sleeps(),
        vec![
            (OVERLOAD_BACKOFF, SleepReason::Backoff),
            (OVERLOAD_BACKOFF, SleepReason::Backoff),
            (OVERLOAD_BACKOFF, SleepReason::Backoff),
            (PACING_DELAY, SleepReason::Pacing),
        ]
    );
}

#[tokio::test]
async fn permanent_error_returns_sentinel_without_retry() {
    let api = Arc::new(ScriptedGeneration::new(vec![Err(rejected()), Ok("unused".to_string())]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(api.clone()).with_sleeper(sleeper.clone());

    let answer = client.predict(&request(&["news"])).await;

    assert_eq!(answer, failure_sentinel("SAP"));
    assert_eq!(answer, "Analysis failed for SAP.");
    assert_eq!(api.calls(), 1);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn service_unavailable_without_overload_status_is_permanent() {
    let api = Arc::new(ScriptedGeneration::new(vec![Err(GenerationError::from_response(
        503,
        "upstream connect error",
    ))]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(api.clone()).with_sleeper(sleeper.clone());

    assert_eq!(client.predict(&request(&["news"])).await, failure_sentinel("SAP"));
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn no_articles_skips_the_call() {
    let api = Arc::new(ScriptedGeneration::new(vec![Ok("unused".to_string())]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = ResilientClient::new(api.clone()).with_sleeper(sleeper.clone());

    assert_eq!(client.predict(&request(&[])).await, NO_ARTICLES_SENTINEL);
    assert_eq!(api.calls(), 0);
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn prompt_carries_company_and_news() {
    let api = Arc::new(ScriptedGeneration::new(vec![Ok("ok".to_string())]));
    let client = ResilientClient::new(api.clone()).with_sleeper(Arc::new(RecordingSleeper::default()));

    client.predict(&request(&["Quartalszahlen gut", "Ausblick stabil"])).await;

    let prompts = api.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("**Company:** SAP"));
    assert!(prompts[0].contains("Quartalszahlen gut\n\n---\n\nAusblick stabil"));
}

struct AlwaysOverloaded {
    calls: AtomicUsize,
}

#[async_trait]
impl GenerationApi for AlwaysOverloaded {
    fn model_name(&self) -> String {
        "overloaded".to_string()
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(overloaded())
    }
}

#[tokio::test(start_paused = true)]
async fn deadline_bounds_the_retry_loop() {
    init_tracing();
    let api = Arc::new(AlwaysOverloaded {
        calls: AtomicUsize::new(0),
    });
    let policy = RetryPolicy::default().with_deadline(Some(Duration::from_secs(100)));
    let client = ResilientClient::new(api.clone())
        .with_policy(policy)
        .with_sleeper(Arc::new(TokioSleeper));

    let answer = client.predict(&request(&["news"])).await;

    assert_eq!(answer, timeout_sentinel("SAP"));
    // attempts at t = 0, 30, 60, 90
    assert_eq!(api.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn concurrent_callers_are_serialized() {
    let api = Arc::new(ScriptedGeneration::new(vec![Ok("one".to_string()), Ok("two".to_string())]));
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = Arc::new(ResilientClient::new(api.clone()).with_sleeper(sleeper.clone()));

    let first = request(&["a"]);
    let second = request(&["b"]);
    let (x, y) = tokio::join!(client.predict(&first), client.predict(&second));

    let mut answers = vec![x, y];
    answers.sort();
    assert_eq!(answers, vec!["one", "two"]);
    assert_eq!(api.calls(), 2);
    assert_eq!(
        sleeper.sleeps(),
        vec![(PACING_DELAY, SleepReason::Pacing), (PACING_DELAY, SleepReason::Pacing)]
    );
}
