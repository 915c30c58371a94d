#![allow(dead_code)]

use async_trait::async_trait;
use news_forecast::generation::{GenerationApi, GenerationError};
use news_forecast::retry::{SleepReason, Sleeper};
use news_forecast::{ArticleText, ForecastError, HttpFetch, NewsSource, Result, RetrievalRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use url::Url;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

type Responder = Box<dyn Fn(&Url) -> Result<String> + Send + Sync>;

/// Serves canned bodies from a closure and records every requested URL.
pub struct FakeHttp {
    responder: Responder,
    requests: Mutex<Vec<Url>>,
}

impl FakeHttp {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Url) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.requests().iter().filter(|url| url.path() == path).count()
    }

    fn respond(&self, url: &Url) -> Result<String> {
        self.requests.lock().unwrap().push(url.clone());
        (self.responder)(url)
    }
}

#[async_trait]
impl HttpFetch for FakeHttp {
    async fn get_json(&self, url: &Url, _headers: &[(&str, &str)]) -> Result<serde_json::Value> {
        let body = self.respond(url)?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, url: &Url, _headers: &[(&str, &str)]) -> Result<String> {
        self.respond(url)
    }
}

pub fn not_found(url: &Url) -> ForecastError {
    ForecastError::Status {
        url: url.to_string(),
        status: 404,
    }
}

/// Replays a fixed sequence of generation outcomes and counts calls.
pub struct ScriptedGeneration {
    script: Mutex<VecDeque<std::result::Result<String, GenerationError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGeneration {
    pub fn new(script: Vec<std::result::Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationApi for ScriptedGeneration {
    fn model_name(&self) -> String {
        "scripted".to_string()
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".to_string())))
    }
}

pub fn overloaded() -> GenerationError {
    GenerationError::from_response(
        503,
        r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#,
    )
}

pub fn rejected() -> GenerationError {
    GenerationError::from_response(
        400,
        r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
    )
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<(Duration, SleepReason)>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<(Duration, SleepReason)> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration, reason: SleepReason) {
        self.sleeps.lock().unwrap().push((duration, reason));
    }
}

pub struct StaticSource {
    pub name: String,
    pub articles: Vec<ArticleText>,
    pub delay: Duration,
}

impl StaticSource {
    pub fn new(name: &str, articles: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            articles: articles.iter().map(|a| a.to_string()).collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl NewsSource for StaticSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn fetch_articles(&self, _request: &RetrievalRequest) -> Result<Vec<ArticleText>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.articles.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl NewsSource for FailingSource {
    fn source_name(&self) -> String {
        "Failing".to_string()
    }

    async fn fetch_articles(&self, _request: &RetrievalRequest) -> Result<Vec<ArticleText>> {
        Err(ForecastError::adapter_configuration("Failing", "endpoint unreachable"))
    }
}
