//! Pipeline integration tests
//!
//! Tests the complete index flow against a synthetic source:
//! 1. Long daily ranges split into windows and stitched back together
//! 2. More than five keywords rescaled through a benchmark term
//! 3. Benchmark selection
//! 4. Weekly, monthly and quarterly output

use chrono::{Datelike, Duration, Weekday};

use trendex::analytics::normalize::zscore;
use trendex::analytics::Normalization;
use trendex::index::{Trendex, CUTOFF_DAILY, OVERLAP};
use trendex::models::Frequency;

use crate::common::{date, relative_spread, settings, SyntheticSource};

/// `trends[term] / interest(term)` for every cell of the output
fn scale_ratios(source: &SyntheticSource, output: &trendex::index::IndexOutput) -> Vec<f64> {
    output
        .trends
        .columns()
        .flat_map(|(term, values)| {
            output
                .trends
                .index()
                .iter()
                .zip(values)
                .map(move |(d, v)| v / source.interest(term, *d))
                .collect::<Vec<_>>()
        })
        .collect()
}

// ============================================================================
// Stitching
// ============================================================================

#[tokio::test]
async fn test_daily_index_stitches_long_range_exactly() {
    let mut settings = settings(&["flu", "fever", "cough"], "2021-01-01", "2022-12-31");
    settings.normalization = Normalization::Zscore;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();
    let output = trendex.make_index().await.unwrap();

    // 730 days in windows of 260 stepping by 215
    assert_eq!(output.timechunks.len(), 4);
    assert_eq!(output.raw_trends.len(), 4);
    assert_eq!(output.adjustment_factors.len(), 3);
    for adjustment in &output.adjustment_factors {
        assert_eq!(adjustment.overlap_rows as i64, OVERLAP + 1);
        assert_eq!(adjustment.factors.len(), 3);
    }
    assert!(output.raw_trends.iter().all(|w| w.len() as i64 <= CUTOFF_DAILY + 1));

    // one row per day, no gaps or repeats
    let index = output.trends.index();
    assert_eq!(index.len(), 730);
    assert_eq!(index[0], date("2021-01-01"));
    assert_eq!(index[729], date("2022-12-31"));
    assert!(index.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));

    // every term on one common scale
    let source = trendex.source();
    assert!(relative_spread(&scale_ratios(source, &output)) < 1e-9);

    // the index is the standardised sum of the underlying interest
    let underlying: Vec<f64> = index
        .iter()
        .map(|d| ["flu", "fever", "cough"].iter().map(|t| source.interest(t, *d)).sum())
        .collect();
    let expected = zscore(&underlying);
    assert_eq!(output.gti.name, "GTI");
    for (got, want) in output.gti.values.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-9);
    }
    assert!(!output.seasonally_adjusted);
}

#[tokio::test]
async fn test_rounded_source_tracks_underlying_signal() {
    let source = SyntheticSource::new()
        .rounded()
        .with_level("flu", 50.0)
        .with_level("fever", 40.0)
        .with_level("cough", 30.0);
    let trendex = Trendex::new(
        settings(&["flu", "fever", "cough"], "2021-01-01", "2022-12-31"),
        source,
        date("2024-01-01"),
    )
    .await
    .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert!(relative_spread(&scale_ratios(trendex.source(), &output)) < 0.15);
}

#[tokio::test]
async fn test_partial_rows_are_dropped() {
    let source = SyntheticSource::new().with_partial_from(date("2022-03-31"));
    let trendex = Trendex::new(
        settings(&["flu"], "2022-01-01", "2022-03-31"),
        source,
        date("2022-03-31"),
    )
    .await
    .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert_eq!(output.trends.last_date(), Some(date("2022-03-30")));
    assert_eq!(output.raw_trends[0].len(), 89);
}

// ============================================================================
// Benchmark
// ============================================================================

#[tokio::test]
async fn test_search_groups_share_benchmark_scale() {
    let keywords = ["flu", "fever", "cough", "chills", "headache", "nausea", "fatigue"];
    let trendex = Trendex::new(
        settings(&keywords, "2021-06-01", "2022-06-30"),
        SyntheticSource::new(),
        date("2024-01-01"),
    )
    .await
    .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert_eq!(output.benchmark.as_deref(), Some("flu"));
    assert_eq!(output.search_groups.len(), 2);
    assert!(output.search_groups.iter().all(|g| g[0] == "flu" && g.len() <= 5));
    assert_eq!(output.trends.width(), keywords.len());

    // two groups per window
    let queries = trendex.source().queries();
    assert_eq!(queries.len(), output.timechunks.len() * 2);

    assert!(relative_spread(&scale_ratios(trendex.source(), &output)) < 1e-9);
}

#[tokio::test]
async fn test_benchmark_selection_picks_strongest_term() {
    let keywords = ["flu", "fever", "cough", "chills", "steady", "nausea", "fatigue"];
    let mut settings = settings(&keywords, "2022-01-01", "2022-06-30");
    settings.select_benchmark = true;

    // the anchor dominates every ranking query, so groups share its scale
    let source = SyntheticSource::new()
        .with_level("football", 200.0)
        .with_level("steady", 90.0);
    let trendex = Trendex::new(settings, source, date("2024-01-01")).await.unwrap();

    let plan = trendex.plan();
    assert_eq!(plan.search.benchmark.as_deref(), Some("steady"));
    assert_eq!(plan.search.keywords[0], "steady");
    assert!(!plan.benchmark_pending);

    // ranking queries carry the anchor term and span the whole range
    let ranking = trendex.source().queries();
    assert_eq!(ranking.len(), 2);
    assert!(ranking.iter().all(|q| q.keywords[0] == "football"));
    assert!(ranking.iter().all(|q| q.timeframe == plan.timeframe));

    let output = trendex.make_index().await.unwrap();
    assert_eq!(output.benchmark.as_deref(), Some("steady"));
    assert!(output.search_groups.iter().all(|g| g[0] == "steady"));
}

// ============================================================================
// Output frequency
// ============================================================================

#[tokio::test]
async fn test_weekly_index_is_seasonally_adjusted() {
    let mut settings = settings(&["flu", "fever"], "2020-01-06", "2022-12-25");
    settings.frequency = Frequency::Weekly;
    settings.seasonal_adjust = true;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert!(output.timechunks.len() > 1);
    assert!(output.trends.len() >= 104);
    assert!(output
        .trends
        .index()
        .iter()
        .all(|d| d.weekday() == Weekday::Mon));
    assert!(output.seasonally_adjusted);
    assert_eq!(output.trends_sa.len(), output.trends.len());

    // scaled onto 0..=100
    let min = output.gti.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = output.gti.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(min.abs() < 1e-9);
    assert!((max - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_monthly_index_uses_single_window() {
    let mut settings = settings(&["flu", "fever"], "2023-01-01", "2023-12-31");
    // a start too close to the end is pushed back for monthly rows
    settings.frequency = Frequency::Monthly;
    settings.seasonal_adjust = true;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert_eq!(output.timechunks.len(), 1);
    assert_eq!(output.timeframe.span_days(), 2000);
    assert!(output.adjustment_factors.is_empty());
    assert!(output.trends.index().iter().all(|d| d.day() == 1));
    assert!(output.seasonally_adjusted);
}

#[tokio::test]
async fn test_quarterly_index_keeps_complete_quarters() {
    let mut settings = settings(&["flu"], "2018-11-01", "2023-12-31");
    settings.date_start = None;
    settings.frequency = Frequency::Quarterly;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();
    let output = trendex.make_index().await.unwrap();

    // the default lookback starts in Oct 2018, an incomplete quarter
    assert_eq!(output.trends.first_date(), Some(date("2019-01-01")));
    assert_eq!(output.trends.len(), 20);
    assert!(output
        .trends
        .index()
        .iter()
        .all(|d| d.day() == 1 && [1, 4, 7, 10].contains(&d.month())));
}
