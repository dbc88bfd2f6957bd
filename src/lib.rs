//! trendex - Search trends index builder
//!
//! Builds a composite index (GTI) from search-interest series for a list of
//! keywords: overlapping time windows are stitched into continuous series,
//! keyword groups are put on a common scale through a benchmark term, and
//! the summed series is seasonally adjusted and normalised.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`source`] - Trends sources: pacing, retries, recorded snapshots
//! - [`index`] - Keyword planning, benchmark selection, pulling and stitching
//! - [`analytics`] - Frames, resampling, seasonal adjustment, normalisation
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use trendex::config::Config;
//! use trendex::index::Trendex;
//! use trendex::source::{SnapshotSource, SnapshotStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = SnapshotStore::open(&config.source.snapshot_dir).await?;
//!     let trendex = Trendex::new(
//!         config.index_settings(),
//!         SnapshotSource::new(store),
//!         Utc::now().date_naive(),
//!     )
//!     .await?;
//!     let output = trendex.make_index().await?;
//!     println!("{}", serde_json::to_string_pretty(&output.gti)?);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod source;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{Normalization, Series, TrendFrame};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TrendexErrorTrait};
    pub use crate::index::{IndexOutput, IndexPlan, IndexSettings, StitchMethod, Trendex};
    pub use crate::models::{Frequency, InterestOverTime, Language, Timeframe, TrendQuery};
    pub use crate::source::{CachedSource, PacedSource, Pacing, SnapshotSource, SnapshotStore, TrendsSource};
}

// Direct re-exports for convenience
pub use models::{Frequency, InterestOverTime, Language, Timeframe, TrendQuery};
