//! Snapshot record/replay tests

use tempfile::TempDir;

use trendex::index::Trendex;
use trendex::models::{Timeframe, TrendQuery};
use trendex::source::{CachedSource, SnapshotSource, SnapshotStore, TrendsSource};
use trendex::utils::error::{IndexError, SourceError};

use crate::common::{date, settings, strings, SyntheticSource};

/// Recorded floats go through JSON, so compare with a tolerance
fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() <= 1e-9 * w.abs().max(1.0), "{g} != {w}");
    }
}

#[tokio::test]
async fn test_recorded_index_replays_identically() {
    let dir = TempDir::new().unwrap();
    let keywords = ["flu", "fever", "cough", "chills", "headache", "nausea"];

    // record through the cache
    let store = SnapshotStore::open(dir.path()).await.unwrap();
    let cached = CachedSource::new(SyntheticSource::new(), store.clone());
    let recorded = Trendex::new(
        settings(&keywords, "2021-06-01", "2022-06-30"),
        cached,
        date("2024-01-01"),
    )
    .await
    .unwrap();
    let first = recorded.make_index().await.unwrap();

    // 2 windows x 2 search groups
    assert_eq!(store.len().await.unwrap(), 4);

    // a second run through the cache does not reach the inner source
    let second = recorded.make_index().await.unwrap();
    assert_close(&second.gti.values, &first.gti.values);
    assert_eq!(recorded.into_source().into_inner().queries().len(), 4);

    // replay without any live source
    let replay = Trendex::new(
        settings(&keywords, "2021-06-01", "2022-06-30"),
        SnapshotSource::new(SnapshotStore::open(dir.path()).await.unwrap()),
        date("2024-01-01"),
    )
    .await
    .unwrap();
    let replayed = replay.make_index().await.unwrap();

    assert_eq!(replayed.gti.index, first.gti.index);
    assert_close(&replayed.gti.values, &first.gti.values);
    assert_eq!(replayed.trends.index(), first.trends.index());
    for ((name, got), (_, want)) in replayed.trends.columns().zip(first.trends.columns()) {
        assert!(first.trends.has_column(name));
        assert_close(got, want);
    }
    assert_eq!(replayed.adjustment_factors.len(), first.adjustment_factors.len());
}

#[tokio::test]
async fn test_replay_of_unrecorded_region_fails() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(dir.path()).await.unwrap();

    let cached = CachedSource::new(SyntheticSource::new(), store.clone());
    Trendex::new(
        settings(&["flu"], "2022-01-01", "2022-03-31"),
        cached,
        date("2024-01-01"),
    )
    .await
    .unwrap()
    .make_index()
    .await
    .unwrap();

    let mut other_geo = settings(&["flu"], "2022-01-01", "2022-03-31");
    other_geo.geo = "GB".to_string();
    let replay = Trendex::new(other_geo, SnapshotSource::new(store), date("2024-01-01"))
        .await
        .unwrap();

    let err = replay.make_index().await.unwrap_err();
    match err {
        IndexError::Source(SourceError::NotRecorded(query)) => {
            assert!(query.starts_with("flu|GB|"));
        }
        other => panic!("expected NotRecorded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_corrupt_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(dir.path()).await.unwrap();

    let timeframe = Timeframe::new(date("2022-01-01"), date("2022-01-03")).unwrap();
    let query = TrendQuery::new(strings(&["flu"]), "US", timeframe);

    // index out of order
    let record = serde_json::json!({
        "query": &query,
        "recorded_at": "2024-01-01T00:00:00Z",
        "response": {
            "frame": {
                "index": ["2022-01-02", "2022-01-01", "2022-01-03"],
                "columns": [{ "name": "flu", "values": [50.0, 60.0, 70.0] }]
            },
            "is_partial": [false, false, false]
        }
    });
    tokio::fs::write(store.path_for(&query), record.to_string())
        .await
        .unwrap();

    let source = SnapshotSource::new(store);
    let err = source.interest_over_time(&query).await.unwrap_err();
    assert!(matches!(err, SourceError::Json(_)));
    assert!(!err.is_recoverable());
}
