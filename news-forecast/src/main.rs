use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use news_forecast::generation::DEFAULT_MODEL;
use news_forecast::sources::build_sources;
use news_forecast::{
    AppConfig, CsvResultSink, ExperimentConfig, ExperimentRunner, FetchConfig, Fetcher, GeminiClient, HttpFetch,
    NewsAggregator, ResilientClient, ResultSink, RetryPolicy, SourceKind, SqliteResultStore, YahooMarketData,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Csv,
    Sqlite,
}

/// Runs the news-driven stock forecast experiment.
#[derive(Debug, Parser)]
#[command(name = "news-forecast", version)]
struct Cli {
    /// Generation model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Last day (exclusive) of the price history, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// News window in days; repeat for several
    #[arg(long = "timeframe")]
    timeframes: Vec<u32>,

    /// Restrict the batch to these companies; repeat for several
    #[arg(long = "company")]
    companies: Vec<String>,

    /// News sources to query; defaults to all
    #[arg(long = "source", value_enum)]
    sources: Vec<SourceKind>,

    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SinkKind::Csv)]
    sink: SinkKind,

    /// Overrides DATABASE_URL for the sqlite sink
    #[arg(long)]
    database_url: Option<String>,

    /// Give up on one prediction after this many seconds of retrying
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Query all news sources at once
    #[arg(long)]
    concurrent_sources: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    info!("Starting news forecast experiment");

    let app_config = AppConfig::from_env().context("failed to load configuration")?;

    let mut experiment = ExperimentConfig {
        concurrent_sources: cli.concurrent_sources,
        ..ExperimentConfig::default()
    };
    if let Some(end_date) = cli.end_date {
        experiment.end_date = end_date;
    }
    if !cli.timeframes.is_empty() {
        experiment.timeframes = cli.timeframes.clone();
    }
    experiment.retain_companies(&cli.companies)?;
    experiment.validate()?;

    let http: Arc<dyn HttpFetch> =
        Arc::new(Fetcher::new(FetchConfig::default()).context("failed to build HTTP client")?);

    let kinds = if cli.sources.is_empty() {
        SourceKind::ALL.to_vec()
    } else {
        cli.sources.clone()
    };
    let aggregator =
        NewsAggregator::new(build_sources(&kinds, http.clone())).with_concurrency(experiment.concurrent_sources);
    info!("News sources: {}", aggregator.source_names().join(", "));

    let mut gemini = GeminiClient::new(app_config.gemini_api_key.clone(), cli.model.clone())
        .context("failed to build generation client")?;
    if let Some(base_url) = &app_config.gemini_base_url {
        gemini = gemini.with_base_url(base_url.clone());
    }
    let policy = RetryPolicy::default().with_deadline(cli.deadline_secs.map(Duration::from_secs));
    let client = ResilientClient::new(Arc::new(gemini)).with_policy(policy);

    let sink: Arc<dyn ResultSink> = match cli.sink {
        SinkKind::Csv => Arc::new(
            CsvResultSink::create(&cli.output_dir, Utc::now()).context("failed to create results file")?,
        ),
        SinkKind::Sqlite => {
            let database_url = cli
                .database_url
                .clone()
                .or_else(|| app_config.database_url.clone())
                .context("--database-url or DATABASE_URL is required for the sqlite sink")?;
            Arc::new(
                SqliteResultStore::new(&database_url)
                    .await
                    .context("failed to open result database")?,
            )
        }
    };

    let runner = ExperimentRunner::new(
        experiment,
        aggregator,
        Arc::new(YahooMarketData::new(http)),
        client,
        sink,
    );
    let summary = runner.run().await;

    info!(
        "Experiment finished: {} runs completed, {} skipped",
        summary.completed, summary.skipped
    );
    Ok(())
}
