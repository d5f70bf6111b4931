//! Scan sessions - fetch a cube's blog and reconstruct its history.
//!
//! This is the high-level entry point: configure a scan, run it, get a
//! [`ScanOutcome`]. It wires the [`cubecobra::BlogClient`] page stream into
//! a [`HistoryScan`] and propagates whichever side fails.

use crate::dom::parse_document;
use crate::history::HistoryError;
use crate::scan::{HistoryScan, ScanOutcome};
use cubecobra::BlogClient;
use futures::StreamExt;
use thiserror::Error;

/// The cube scanned when none is named on the command line.
pub const DEFAULT_CUBE_ID: &str = "modernclassics";

/// Blog pages fetched per run unless overridden.
pub const DEFAULT_MAX_PAGES: usize = 9;

/// Errors from running a scan session.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] cubecobra::Error),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Configuration for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// The cube whose blog is scanned.
    pub cube_id: String,

    /// How many blog pages to fetch, newest first. The scan stops earlier
    /// at the first page CubeCobra does not serve.
    pub max_pages: usize,

    /// Base URL override; falls back to the `CUBECOBRA_BASE_URL`
    /// environment variable, then the public site.
    pub base_url: Option<String>,
}

impl ScanConfig {
    /// Create a scan config for the given cube.
    pub fn new(cube_id: impl Into<String>) -> Self {
        Self {
            cube_id: cube_id.into(),
            max_pages: DEFAULT_MAX_PAGES,
            base_url: None,
        }
    }

    /// Set how many pages to fetch.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the CubeCobra base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Run one scan: fetch the cube's blog newest-first, ingest every page,
/// replay the history.
pub async fn run(config: ScanConfig) -> Result<ScanOutcome, ScanError> {
    let client = match config.base_url.as_deref() {
        Some(base) => BlogClient::new().with_base_url(base),
        None => BlogClient::from_env(),
    };
    run_with_client(&client, &config).await
}

/// Like [`run`], but with a caller-supplied client.
pub async fn run_with_client(
    client: &BlogClient,
    config: &ScanConfig,
) -> Result<ScanOutcome, ScanError> {
    let mut scan = HistoryScan::new(config.cube_id.as_str());
    let mut pages = Box::pin(client.blog_pages(&config.cube_id, config.max_pages));
    while let Some(page) = pages.next().await {
        let page = page?;
        scan.ingest_document(&parse_document(&page.html));
    }
    Ok(scan.finish()?)
}
