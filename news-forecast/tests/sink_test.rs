use chrono::{NaiveDate, TimeZone, Utc};
use news_forecast::{CsvResultSink, ExperimentRecord, ResultSink, SqliteResultStore};
use uuid::Uuid;

fn record(batch_id: Uuid, run_id: u32, company: &str, recommendation: &str) -> ExperimentRecord {
    ExperimentRecord {
        batch_id,
        run_id,
        analysis_date: NaiveDate::from_ymd_opt(2025, 9, 23).unwrap(),
        company: company.to_string(),
        industry: "Automobil".to_string(),
        window_days: 7,
        article_count: 3,
        price_at_forecast: 101.25,
        price_7_days_prior: None,
        recommendation: recommendation.to_string(),
        sentiment: "positiv; stabil".to_string(),
        reasoning: "Gute Zahlen".to_string(),
        raw_prediction: "Recommendation: BUY\nReasoning: Gute Zahlen".to_string(),
        snippet: "VW meldet...".to_string(),
    }
}

#[tokio::test]
async fn csv_sink_writes_header_once_and_flushes_each_row() {
    let dir = tempfile::tempdir().unwrap();
    let started = Utc.with_ymd_and_hms(2025, 9, 23, 14, 5, 9).unwrap();
    let sink = CsvResultSink::create(&dir.path().join("results"), started).unwrap();
    assert!(sink.path().ends_with("experiment_results_20250923_140509.csv"));

    let batch = Uuid::new_v4();
    sink.append(&record(batch, 1, "BMW", "BUY")).await.unwrap();
    let after_one = std::fs::read_to_string(sink.path()).unwrap();
    assert!(after_one.starts_with("batch_id;run_id;analysis_date;company;"));
    assert!(after_one.contains("\"Recommendation: BUY\nReasoning: Gute Zahlen\""));

    sink.append(&record(batch, 2, "Volkswagen", "SELL")).await.unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(sink.path())
        .unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "batch_id");
    assert_eq!(&headers[1], "run_id");

    let rows: Vec<ExperimentRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].company, "Volkswagen");
    assert_eq!(rows[0].sentiment, "positiv; stabil");
    assert_eq!(rows[0].raw_prediction, "Recommendation: BUY\nReasoning: Gute Zahlen");
    assert_eq!(rows[0].price_7_days_prior, None);
}

#[tokio::test]
async fn sqlite_store_appends_rows_per_batch() {
    let store = SqliteResultStore::new("sqlite::memory:").await.unwrap();
    let batch = Uuid::new_v4();
    let other = Uuid::new_v4();

    store.append(&record(batch, 1, "BMW", "BUY")).await.unwrap();
    store.append(&record(batch, 2, "BMW", "SELL")).await.unwrap();
    store.append(&record(other, 1, "Adidas", "BUY")).await.unwrap();

    assert_eq!(store.count_for_batch(batch).await.unwrap(), 2);
    assert_eq!(
        store.list_batch(batch).await.unwrap(),
        vec![(1, "BMW".to_string(), "BUY".to_string()), (2, "BMW".to_string(), "SELL".to_string())]
    );
}

#[tokio::test]
async fn sqlite_store_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("results.db").display());
    let batch = Uuid::new_v4();

    {
        let store = SqliteResultStore::new(&url).await.unwrap();
        store.append(&record(batch, 1, "SAP", "BUY")).await.unwrap();
    }

    let reopened = SqliteResultStore::new(&url).await.unwrap();
    assert_eq!(reopened.count_for_batch(batch).await.unwrap(), 1);
}
