//! Error scenario tests
//!
//! Tests failure handling across the pipeline:
//! - Weak benchmark terms
//! - Invalid settings
//! - Missing recorded responses
//! - Transient source failures
//! - Ranges too short for the output frequency

use tempfile::TempDir;

use trendex::error::{Error, ErrorCategory, TrendexErrorTrait};
use trendex::index::Trendex;
use trendex::models::{Frequency, Language};
use trendex::source::{PacedSource, Pacing, SnapshotSource, SnapshotStore};
use trendex::utils::error::{IndexError, SourceError};
use trendex::utils::retry::RetryConfig;

use crate::common::{date, settings, FlakySource, SyntheticSource};

const SEVEN: [&str; 7] = ["rare", "flu", "fever", "cough", "chills", "nausea", "fatigue"];

// ============================================================================
// Benchmark failures
// ============================================================================

#[tokio::test]
async fn test_weak_first_term_aborts_without_selection() {
    let source = SyntheticSource::new().with_sparse("rare");
    let trendex = Trendex::new(
        settings(&SEVEN, "2022-01-01", "2022-03-31"),
        source,
        date("2024-01-01"),
    )
    .await
    .unwrap();

    let err = trendex.make_index().await.unwrap_err();
    match err {
        IndexError::WeakBenchmark { term, start, end } => {
            assert_eq!(term, "rare");
            assert_eq!(start, "2022-01-01");
            assert_eq!(end, "2022-03-31");
        }
        other => panic!("expected WeakBenchmark, got {other:?}"),
    }
}

#[tokio::test]
async fn test_selected_weak_benchmark_is_only_reported() {
    let mut settings = settings(&SEVEN, "2022-01-01", "2022-03-31");
    settings.select_benchmark = true;

    let source = SyntheticSource::new()
        .with_level("football", 2_000.0)
        .with_level("rare", 500.0)
        .with_sparse("rare");
    let trendex = Trendex::new(settings, source, date("2024-01-01")).await.unwrap();
    assert_eq!(trendex.plan().search.benchmark.as_deref(), Some("rare"));

    let output = trendex.make_index().await.unwrap();
    assert_eq!(output.trends.width(), SEVEN.len());
    assert!(output.gti.values.iter().all(|v| v.is_finite()));
}

#[tokio::test]
async fn test_selection_needs_supported_language() {
    let mut settings = settings(&SEVEN, "2022-01-01", "2022-03-31");
    settings.select_benchmark = true;
    settings.language = Language::from("de".to_string());

    let result = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01")).await;
    match result {
        Err(IndexError::UnsupportedLanguage(code)) => assert_eq!(code, "de"),
        Err(other) => panic!("expected UnsupportedLanguage, got {other:?}"),
        Ok(_) => panic!("expected UnsupportedLanguage"),
    }
}

// ============================================================================
// Invalid settings
// ============================================================================

#[tokio::test]
async fn test_blank_keywords_rejected() {
    let result = Trendex::new(
        settings(&[" ", ""], "2022-01-01", "2022-03-31"),
        SyntheticSource::new(),
        date("2024-01-01"),
    )
    .await;
    assert!(matches!(result, Err(IndexError::NoKeywords)));
}

#[tokio::test]
async fn test_start_after_end_rejected() {
    let result = Trendex::new(
        settings(&["flu"], "2022-05-01", "2022-03-31"),
        SyntheticSource::new(),
        date("2024-01-01"),
    )
    .await;

    let err = result.err().unwrap();
    assert!(matches!(err, IndexError::InvalidDateRange { .. }));
    assert_eq!(Error::from(err).category(), ErrorCategory::Config);
}

// ============================================================================
// Source failures
// ============================================================================

#[tokio::test]
async fn test_missing_snapshot_is_not_recoverable() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(dir.path()).await.unwrap();
    let trendex = Trendex::new(
        settings(&["flu", "fever"], "2022-01-01", "2022-03-31"),
        SnapshotSource::new(store),
        date("2024-01-01"),
    )
    .await
    .unwrap();

    let err = trendex.make_index().await.unwrap_err();
    assert!(matches!(
        err,
        IndexError::Source(SourceError::NotRecorded(_))
    ));

    let err = Error::from(err);
    assert_eq!(err.category(), ErrorCategory::Source);
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_paced_source_retries_rate_limits() {
    let flaky = FlakySource::new(SyntheticSource::new(), 2);
    let source = PacedSource::new(
        flaky,
        6_000,
        Pacing::disabled(),
        RetryConfig::with_delays(3, 1, 5),
    );
    let trendex = Trendex::new(
        settings(&["flu", "fever"], "2022-01-01", "2022-03-31"),
        source,
        date("2024-01-01"),
    )
    .await
    .unwrap();

    let output = trendex.make_index().await.unwrap();
    assert_eq!(output.trends.len(), 90);

    let paced = trendex.into_source();
    assert_eq!(paced.issued(), 1);
    assert_eq!(paced.into_inner().calls(), 3);
}

#[tokio::test]
async fn test_paced_source_gives_up_after_max_retries() {
    let flaky = FlakySource::new(SyntheticSource::new(), 10);
    let source = PacedSource::new(
        flaky,
        6_000,
        Pacing::disabled(),
        RetryConfig::with_delays(2, 1, 5),
    );
    let trendex = Trendex::new(
        settings(&["flu"], "2022-01-01", "2022-03-31"),
        source,
        date("2024-01-01"),
    )
    .await
    .unwrap();

    let err = trendex.make_index().await.unwrap_err();
    assert!(matches!(
        err,
        IndexError::Source(SourceError::MaxRetriesExceeded)
    ));

    let err = Error::from(err);
    assert!(!err.is_recoverable());
    assert_eq!(err.category(), ErrorCategory::Source);
}

// ============================================================================
// Short ranges
// ============================================================================

#[tokio::test]
async fn test_short_weekly_range_skips_seasonal_adjustment() {
    let mut settings = settings(&["flu", "fever"], "2022-01-03", "2022-06-26");
    settings.frequency = Frequency::Weekly;
    settings.seasonal_adjust = true;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();
    let output = trendex.make_index().await.unwrap();

    assert_eq!(output.trends.len(), 25);
    assert!(!output.seasonally_adjusted);
    assert_eq!(output.gti.len(), 25);
    // per-term adjustment falls back to the unadjusted values as well
    assert_eq!(output.trends_sa, output.trends);
}

#[tokio::test]
async fn test_range_without_complete_week_is_empty() {
    let mut settings = settings(&["flu"], "2022-01-04", "2022-01-08");
    settings.frequency = Frequency::Weekly;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();

    let err = trendex.make_index().await.unwrap_err();
    assert!(matches!(err, IndexError::EmptyWindow(_)));
}

#[tokio::test]
async fn test_single_day_weekly_range_is_empty() {
    // 2022-01-05 is a Wednesday
    let mut settings = settings(&["flu"], "2022-01-05", "2022-01-05");
    settings.frequency = Frequency::Weekly;

    let trendex = Trendex::new(settings, SyntheticSource::new(), date("2024-01-01"))
        .await
        .unwrap();

    let err = trendex.make_index().await.unwrap_err();
    assert!(matches!(err, IndexError::EmptyWindow(_)));
}
