pub mod discovery;
pub mod handelsblatt;
pub mod spiegel;
pub mod tagesschau;

pub use handelsblatt::HandelsblattSource;
pub use spiegel::SpiegelSource;
pub use tagesschau::TagesschauSource;

use crate::fetcher::HttpFetch;
use crate::traits::NewsSource;
use std::sync::Arc;

/// The news providers this crate knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SourceKind {
    Tagesschau,
    Spiegel,
    Handelsblatt,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Tagesschau, SourceKind::Spiegel, SourceKind::Handelsblatt];

    pub fn build(self, http: Arc<dyn HttpFetch>) -> Box<dyn NewsSource> {
        match self {
            SourceKind::Tagesschau => Box::new(TagesschauSource::new(http)),
            SourceKind::Spiegel => Box::new(SpiegelSource::new(http)),
            SourceKind::Handelsblatt => Box::new(HandelsblattSource::new(http)),
        }
    }
}

/// Builds one source per kind, sharing a single HTTP client.
pub fn build_sources(kinds: &[SourceKind], http: Arc<dyn HttpFetch>) -> Vec<Box<dyn NewsSource>> {
    kinds.iter().map(|kind| kind.build(http.clone())).collect()
}
