//! Trends index construction
//!
//! [`Trendex`] runs the whole pipeline for a keyword list:
//!
//! 1. resolve the date range and split it into overlapping windows
//! 2. choose a benchmark term and search groups when there are more than
//!    five keywords
//! 3. pull every window, rescaling search groups onto the benchmark
//! 4. stitch the windows into one continuous frame
//! 5. resample to the output frequency and seasonally adjust
//! 6. sum the terms and normalise the sum into the index (GTI)
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use trendex::index::{IndexSettings, Trendex};
//! use trendex::source::{SnapshotSource, SnapshotStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let source = SnapshotSource::new(SnapshotStore::open("./snapshots").await?);
//! let settings = IndexSettings::new(vec!["flu".into(), "fever".into()], "US");
//! let trendex = Trendex::new(settings, source, Utc::now().date_naive()).await?;
//! let output = trendex.make_index().await?;
//! println!("{} index points", output.gti.len());
//! # Ok(())
//! # }
//! ```

pub mod benchmark;
pub mod keywords;
pub mod plan;
pub mod pull;
pub mod stitch;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{decompose, resample, seasonally_adjust, Normalization, Series, TrendFrame};
use crate::models::{Frequency, Language, Timeframe, TrendQuery, MAX_QUERY_TERMS};
use crate::source::TrendsSource;
use crate::utils::error::IndexError;

pub use benchmark::{
    candidate_groups, optimal_benchmark, plan_searches, rank_candidates, BenchmarkScore, SearchPlan,
};
pub use keywords::{combine_keywords, search_groups, too_small, COMBINED_MAX_LEN, KW_LIMIT};
pub use plan::{resolve_dates, timechunks, CUTOFF_DAILY, CUTOFF_MONTHLY, MIN_MONTHLY_SPAN, OVERLAP};
pub use pull::pull_timeframe;
pub use stitch::{stitch, ChunkAdjustment, StitchMethod, Stitcher};

/// Name of the composite index series
pub const GTI_NAME: &str = "GTI";

/// Everything that shapes an index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    /// Search terms, in priority order
    pub keywords: Vec<String>,

    /// Region code, empty for worldwide
    pub geo: String,

    /// Language of the keywords, for benchmark selection
    pub language: Language,

    /// First date, defaulted from the frequency when absent
    pub date_start: Option<NaiveDate>,

    /// Last date, defaults to today
    pub date_end: Option<NaiveDate>,

    pub frequency: Frequency,

    /// Adjust the summed index for seasonality
    pub seasonal_adjust: bool,

    /// Fold lists longer than [`KW_LIMIT`] into OR-terms
    pub split_keywords: bool,

    /// Pick the benchmark by ranking candidates instead of using the first term
    pub select_benchmark: bool,

    pub normalization: Normalization,

    pub stitch: StitchMethod,
}

impl IndexSettings {
    /// Settings with defaults for everything but the keywords and region
    pub fn new(keywords: Vec<String>, geo: impl Into<String>) -> Self {
        Self {
            keywords,
            geo: geo.into(),
            language: Language::En,
            date_start: None,
            date_end: None,
            frequency: Frequency::Daily,
            seasonal_adjust: true,
            split_keywords: true,
            select_benchmark: true,
            normalization: Normalization::default(),
            stitch: StitchMethod::default(),
        }
    }
}

/// Keywords as queried: trimmed, deduplicated and folded when too many
pub fn resolve_keywords(keywords: &[String], split: bool) -> Result<Vec<String>, IndexError> {
    let mut resolved: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        if resolved.iter().any(|k| k == keyword) {
            warn!(keyword = %keyword, "Dropping duplicate keyword");
            continue;
        }
        resolved.push(keyword.to_string());
    }

    if resolved.is_empty() {
        return Err(IndexError::NoKeywords);
    }
    if split && resolved.len() > KW_LIMIT {
        let combined = combine_keywords(&resolved, COMBINED_MAX_LEN);
        info!(
            keywords = resolved.len(),
            terms = combined.len(),
            "Folding keyword list into OR-terms"
        );
        return Ok(combined);
    }
    Ok(resolved)
}

/// Dates, windows and searches resolved without querying the source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPlan {
    pub timeframe: Timeframe,
    pub timechunks: Vec<Timeframe>,
    pub search: SearchPlan,

    /// The benchmark shown is provisional until candidates are ranked
    pub benchmark_pending: bool,
}

impl IndexPlan {
    /// Resolve everything that needs no query
    ///
    /// With benchmark selection on and more than five terms, the first term
    /// stands in for the benchmark.
    pub fn resolve(settings: &IndexSettings, today: NaiveDate) -> Result<Self, IndexError> {
        let keywords = resolve_keywords(&settings.keywords, settings.split_keywords)?;
        let timeframe = resolve_dates(
            settings.date_start,
            settings.date_end,
            settings.frequency,
            today,
        )?;
        let timechunks = plan::windows_for(settings.frequency, timeframe);

        let needs_benchmark = keywords.len() > MAX_QUERY_TERMS;
        let search = if needs_benchmark {
            let first = keywords[0].clone();
            SearchPlan::with_benchmark(keywords, &first)
        } else {
            SearchPlan::single(keywords)
        };

        Ok(Self {
            timeframe,
            timechunks,
            search,
            benchmark_pending: needs_benchmark && settings.select_benchmark,
        })
    }

    /// Every query pulling the windows needs, window by window
    #[must_use]
    pub fn window_queries(&self, geo: &str) -> Vec<TrendQuery> {
        self.timechunks
            .iter()
            .flat_map(|window| {
                self.search
                    .groups
                    .iter()
                    .map(move |group| TrendQuery::new(group.clone(), geo, *window))
            })
            .collect()
    }

    /// Queries that rank benchmark candidates, empty unless selection is pending
    pub fn benchmark_queries(
        &self,
        language: &Language,
        geo: &str,
    ) -> Result<Vec<TrendQuery>, IndexError> {
        if !self.benchmark_pending {
            return Ok(Vec::new());
        }
        let (_, groups) = candidate_groups(&self.search.keywords, language)?;
        Ok(groups
            .into_iter()
            .map(|group| TrendQuery::new(group, geo, self.timeframe))
            .collect())
    }
}

/// Result of [`Trendex::make_index`]
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutput {
    pub keywords: Vec<String>,
    pub geo: String,
    pub frequency: Frequency,
    pub normalization: Normalization,
    pub timeframe: Timeframe,
    pub timechunks: Vec<Timeframe>,
    pub benchmark: Option<String>,
    pub search_groups: Vec<Vec<String>>,

    /// Each window as pulled, before stitching
    pub raw_trends: Vec<TrendFrame>,

    /// Stitched windows at the source's row frequency
    pub raw_trends_adjusted: TrendFrame,

    /// Factors applied to every window after the first
    pub adjustment_factors: Vec<ChunkAdjustment>,

    /// Per-term series at the output frequency
    pub trends: TrendFrame,

    /// `trends` with every term seasonally adjusted
    pub trends_sa: TrendFrame,

    /// Whether the index itself was seasonally adjusted
    pub seasonally_adjusted: bool,

    /// The composite index
    pub gti: Series,
}

/// Index builder over a trends source
pub struct Trendex<S> {
    settings: IndexSettings,
    source: S,
    plan: IndexPlan,
}

impl<S: TrendsSource> Trendex<S> {
    /// Resolve the plan, ranking benchmark candidates when required
    pub async fn new(settings: IndexSettings, source: S, today: NaiveDate) -> Result<Self, IndexError> {
        let mut plan = IndexPlan::resolve(&settings, today)?;
        if plan.benchmark_pending {
            let keywords = plan.search.keywords.clone();
            plan.search = plan_searches(
                &source,
                &keywords,
                true,
                &settings.language,
                &settings.geo,
                plan.timeframe,
            )
            .await?;
            plan.benchmark_pending = false;
        }

        info!(
            terms = plan.search.keywords.len(),
            timeframe = %plan.timeframe,
            chunks = plan.timechunks.len(),
            groups = plan.search.groups.len(),
            benchmark = plan.search.benchmark.as_deref().unwrap_or("-"),
            "Index planned"
        );

        Ok(Self {
            settings,
            source,
            plan,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    #[must_use]
    pub fn plan(&self) -> &IndexPlan {
        &self.plan
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Pull, stitch, resample, adjust and normalise
    pub async fn make_index(&self) -> Result<IndexOutput, IndexError> {
        let settings = &self.settings;
        let plan = &self.plan;
        let total = plan.timechunks.len();

        let mut raw_trends = Vec::with_capacity(total);
        let mut stitcher = Stitcher::new(settings.stitch);
        for (i, window) in plan.timechunks.iter().enumerate() {
            info!(chunk = i + 1, total, window = %window, "Pulling time chunk");
            let frame = pull_timeframe(
                &self.source,
                &plan.search,
                &settings.geo,
                *window,
                settings.select_benchmark,
            )
            .await?;
            stitcher.push(&frame)?;
            raw_trends.push(frame);
        }
        let (raw_trends_adjusted, adjustment_factors) = stitcher.finish();

        let trends = resample(&raw_trends_adjusted, settings.frequency)?;
        if trends.is_empty() {
            return Err(IndexError::EmptyWindow(plan.timeframe.to_string()));
        }

        let period = settings.frequency.seasonal_period();
        let trends_sa = trends.map_columns(|_, values| match decompose(values, period) {
            Some(d) => d.adjusted(),
            None => values.to_vec(),
        })?;

        let summed = trends.row_sums(GTI_NAME);
        let (summed, seasonally_adjusted) = if settings.seasonal_adjust {
            match seasonally_adjust(&summed, period) {
                Some(adjusted) => (adjusted, true),
                None => {
                    warn!(
                        rows = summed.len(),
                        period,
                        "Series too short for seasonal adjustment, index left unadjusted"
                    );
                    (summed, false)
                }
            }
        } else {
            (summed, false)
        };
        let gti = settings.normalization.apply(&summed);

        info!(
            rows = gti.len(),
            frequency = %settings.frequency,
            seasonally_adjusted,
            "Index built"
        );

        Ok(IndexOutput {
            keywords: plan.search.keywords.clone(),
            geo: settings.geo.clone(),
            frequency: settings.frequency,
            normalization: settings.normalization,
            timeframe: plan.timeframe,
            timechunks: plan.timechunks.clone(),
            benchmark: plan.search.benchmark.clone(),
            search_groups: plan.search.groups.clone(),
            raw_trends,
            raw_trends_adjusted,
            adjustment_factors,
            trends,
            trends_sa,
            seasonally_adjusted,
            gti,
        })
    }
}
