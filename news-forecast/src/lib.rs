pub mod types;
pub mod traits;
pub mod fetcher;
pub mod extract;
pub mod recency;
pub mod sources;
pub mod aggregator;
pub mod prompt;
pub mod generation;
pub mod retry;
pub mod prediction;
pub mod market_data;
pub mod sink;
pub mod store;
pub mod config;
pub mod experiment;

pub use types::*;
pub use traits::{MarketData, NewsSource, ResultSink};
pub use fetcher::{Fetcher, HostPacer, HttpFetch};
pub use aggregator::NewsAggregator;
pub use prompt::PromptCompiler;
pub use generation::{GeminiClient, GenerationApi, GenerationError};
pub use retry::{ResilientClient, RetryPolicy};
pub use prediction::{parse_prediction, ParsedPrediction};
pub use market_data::YahooMarketData;
pub use sink::CsvResultSink;
pub use store::SqliteResultStore;
pub use config::{AppConfig, Company, ExperimentConfig};
pub use experiment::ExperimentRunner;
pub use sources::{HandelsblattSource, SourceKind, SpiegelSource, TagesschauSource};
