//! CubeCobra cube history reconstruction engine.
//!
//! This crate provides:
//! - A forgiving HTML document model for server-rendered blog pages
//! - Location and decoding of the embedded `window.reactProps` payload
//! - The changelist event grammar (card additions and card swaps)
//! - Chronological replay of swaps across append-only card slots
//! - Scan orchestration over the paginated, newest-first blog
//!
//! # Quick Start
//!
//! ```ignore
//! use cubehist_core::{session, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::new("modernclassics").with_max_pages(3);
//!     let outcome = session::run(config).await?;
//!
//!     if let Some(report) = &outcome.report {
//!         println!(
//!             "Most varied: {}, {}",
//!             report.most_varied.variations, report.most_varied.history
//!         );
//!         println!("{} slots have never changed", report.unchanged_slots);
//!     }
//!     Ok(())
//! }
//! ```

pub mod dom;
pub mod event;
pub mod history;
pub mod payload;
pub mod scan;
pub mod session;
pub mod testing;

// Primary public API
pub use dom::{parse_document, Node};
pub use event::{Addition, Change};
pub use history::{CubeHistory, HistoryError, HistoryReport, Slot, SlotSummary};
pub use payload::{Page, Post};
pub use scan::{HistoryScan, PageStats, ScanOutcome};
pub use session::{ScanConfig, ScanError, DEFAULT_CUBE_ID, DEFAULT_MAX_PAGES};
pub use testing::ScanHarness;
