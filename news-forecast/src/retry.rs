//! Prediction calls against a rate-limited generation endpoint.
//!
//! Overload responses are retried forever on a fixed interval, every success
//! is followed by a pacing pause and any other failure is reported as a
//! sentinel string. One request is in flight at a time.

use crate::generation::{GenerationApi, GenerationError};
use crate::prompt::PromptCompiler;
use crate::types::PredictionRequest;
use async_trait::async_trait;
use backoff::backoff::{Backoff, Constant};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const OVERLOAD_BACKOFF: Duration = Duration::from_secs(30);
pub const PACING_DELAY: Duration = Duration::from_secs(13);
pub const NO_ARTICLES_SENTINEL: &str = "Insufficient data for a prediction.";

pub fn failure_sentinel(company_name: &str) -> String {
    format!("Analysis failed for {}.", company_name)
}

pub fn timeout_sentinel(company_name: &str) -> String {
    format!("Analysis timed out for {}.", company_name)
}

/// How a failed call is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Wait and try again.
    Overload,
    /// Give up and return the failure sentinel.
    Permanent,
}

pub fn classify(error: &GenerationError) -> ErrorClass {
    if error.is_overload() {
        ErrorClass::Overload
    } else {
        ErrorClass::Permanent
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub backoff: Duration,
    pub pacing: Duration,
    pub classifier: fn(&GenerationError) -> ErrorClass,
    /// Upper bound on the attempt loop. Pacing is not counted.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: OVERLOAD_BACKOFF,
            pacing: PACING_DELAY,
            classifier: classify,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    Backoff,
    Pacing,
}

/// Waiting primitive, swapped out in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration, reason: SleepReason);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration, _reason: SleepReason) {
        tokio::time::sleep(duration).await;
    }
}

pub struct ResilientClient {
    api: Arc<dyn GenerationApi>,
    compiler: PromptCompiler,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    in_flight: Mutex<()>,
}

impl ResilientClient {
    pub fn new(api: Arc<dyn GenerationApi>) -> Self {
        Self {
            api,
            compiler: PromptCompiler::default(),
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_compiler(mut self, compiler: PromptCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Model answer for `request`, or one of the sentinel strings. Never
    /// fails.
    pub async fn predict(&self, request: &PredictionRequest) -> String {
        if request.articles.is_empty() {
            info!("No articles for {}, skipping prediction", request.company_name);
            return NO_ARTICLES_SENTINEL.to_string();
        }

        let prompt = self.compiler.compile(request);
        self.send(&request.company_name, &prompt).await
    }

    /// Sends an already compiled prompt under the retry policy.
    pub async fn send(&self, company_name: &str, prompt: &str) -> String {
        let _guard = self.in_flight.lock().await;

        let outcome = match self.policy.deadline {
            Some(limit) => match tokio::time::timeout(limit, self.attempt_loop(company_name, prompt)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("Prediction for {} exceeded {:?}", company_name, limit);
                    return timeout_sentinel(company_name);
                }
            },
            None => self.attempt_loop(company_name, prompt).await,
        };

        match outcome {
            Ok(text) => {
                info!("Prediction for {} received, pausing {:?}", company_name, self.policy.pacing);
                self.sleeper.sleep(self.policy.pacing, SleepReason::Pacing).await;
                text
            }
            Err(e) => {
                error!("Prediction for {} failed: {}", company_name, e);
                failure_sentinel(company_name)
            }
        }
    }

    async fn attempt_loop(&self, company_name: &str, prompt: &str) -> Result<String, GenerationError> {
        let mut backoff = Constant::new(self.policy.backoff);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.api.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if (self.policy.classifier)(&e) == ErrorClass::Overload => {
                    let delay = backoff.next_backoff().unwrap_or(self.policy.backoff);
                    warn!(
                        "{} overloaded on attempt {} for {}: {}. Retrying in {:?}",
                        self.api.model_name(),
                        attempt,
                        company_name,
                        e,
                        delay
                    );
                    self.sleeper.sleep(delay, SleepReason::Backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
