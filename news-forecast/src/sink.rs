use crate::traits::ResultSink;
use crate::types::{ExperimentRecord, ForecastError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Semicolon separated results file. The header is written with the first
/// row and every row is flushed as soon as it is appended.
pub struct CsvResultSink {
    path: PathBuf,
    writer: Mutex<Writer<File>>,
}

impl CsvResultSink {
    pub fn file_name(started_at: DateTime<Utc>) -> String {
        format!("experiment_results_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
    }

    /// Opens a new timestamped file in `output_dir`, creating the directory.
    pub fn create(output_dir: &Path, started_at: DateTime<Utc>) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Self::open(output_dir.join(Self::file_name(started_at)))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let writer = WriterBuilder::new().delimiter(b';').from_path(&path)?;
        info!("Writing experiment results to {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for CsvResultSink {
    async fn append(&self, record: &ExperimentRecord) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ForecastError::General("result writer lock poisoned".to_string()))?;
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}
