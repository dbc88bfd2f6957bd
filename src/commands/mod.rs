pub mod build;
pub mod plan;
pub mod record;

use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

use trendex::analytics::Normalization;
use trendex::config::Config;
use trendex::index::StitchMethod;
use trendex::models::{Frequency, Language};

// Re-export command functions for convenience
pub use build::build;
pub use plan::plan;
pub use record::{record, RecordArgs};

/// Index options shared by `build` and `plan`, overriding the configuration
#[derive(Args, Debug, Default)]
pub struct IndexArgs {
    /// Search terms, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Region code (e.g. US), empty for worldwide
    #[arg(short, long)]
    pub geo: Option<String>,

    /// Keyword language for benchmark selection (en, es)
    #[arg(long)]
    pub lang: Option<String>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Output frequency (daily, weekly, monthly, quarterly)
    #[arg(short, long)]
    pub frequency: Option<Frequency>,

    /// Index scale (scale100, zscore)
    #[arg(long)]
    pub normalization: Option<Normalization>,

    /// Overlap factor (ratio_of_means, mean_of_ratios)
    #[arg(long)]
    pub stitch: Option<StitchMethod>,

    /// Leave the index seasonally unadjusted
    #[arg(long, default_value = "false")]
    pub no_seasonal_adjust: bool,

    /// Use the first keyword as benchmark instead of ranking candidates
    #[arg(long, default_value = "false")]
    pub no_benchmark_select: bool,

    /// Never fold long keyword lists into OR-terms
    #[arg(long, default_value = "false")]
    pub no_split: bool,

    /// Directory of recorded responses
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

impl IndexArgs {
    /// Override configuration values with the flags that were given
    pub fn apply(&self, config: &mut Config) {
        let index = &mut config.index;
        if !self.keywords.is_empty() {
            index.keywords = self.keywords.clone();
        }
        if let Some(geo) = &self.geo {
            index.geo = geo.clone();
        }
        if let Some(lang) = &self.lang {
            index.language = Language::from(lang.trim().to_string());
        }
        if self.start.is_some() {
            index.date_start = self.start;
        }
        if self.end.is_some() {
            index.date_end = self.end;
        }
        if let Some(frequency) = self.frequency {
            index.frequency = frequency;
        }
        if let Some(normalization) = self.normalization {
            index.normalization = normalization;
        }
        if let Some(stitch) = self.stitch {
            index.stitch = stitch;
        }
        if self.no_seasonal_adjust {
            index.seasonal_adjust = false;
        }
        if self.no_benchmark_select {
            index.select_benchmark = false;
        }
        if self.no_split {
            index.split_keywords = false;
        }
        if let Some(dir) = &self.snapshot_dir {
            config.source.snapshot_dir = dir.clone();
        }
    }
}
