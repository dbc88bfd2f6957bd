//! Common test utilities
//!
//! [`SyntheticSource`] answers queries from a known underlying interest
//! curve per term and scales every response to its own peak of 100, the way
//! the real service does. Tests can then check that stitching and benchmark
//! rescaling recover the underlying curve.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use trendex::analytics::TrendFrame;
use trendex::index::IndexSettings;
use trendex::models::{InterestOverTime, TrendQuery};
use trendex::source::TrendsSource;
use trendex::utils::error::SourceError;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Settings with deterministic dates and no automatic benchmark selection
pub fn settings(keywords: &[&str], start: &str, end: &str) -> IndexSettings {
    let mut settings = IndexSettings::new(strings(keywords), "US");
    settings.date_start = Some(date(start));
    settings.date_end = Some(date(end));
    settings.select_benchmark = false;
    settings.seasonal_adjust = false;
    settings
}

/// Deterministic interest curves behind an in-memory trends source
#[derive(Default)]
pub struct SyntheticSource {
    levels: HashMap<String, f64>,
    sparse: HashSet<String>,
    rounded: bool,
    partial_from: Option<NaiveDate>,
    queries: Mutex<Vec<TrendQuery>>,
}

impl SyntheticSource {
    /// Exact (unrounded) responses with default levels
    pub fn new() -> Self {
        Self::default()
    }

    /// Round responses to integers like the real service
    pub fn rounded(mut self) -> Self {
        self.rounded = true;
        self
    }

    /// Fix the base level of `term`
    pub fn with_level(mut self, term: &str, level: f64) -> Self {
        self.levels.insert(term.to_string(), level);
        self
    }

    /// Make `term` zero on every third day
    pub fn with_sparse(mut self, term: &str) -> Self {
        self.sparse.insert(term.to_string());
        self
    }

    /// Flag rows dated on or after `date` as partial
    pub fn with_partial_from(mut self, date: NaiveDate) -> Self {
        self.partial_from = Some(date);
        self
    }

    /// Queries answered so far, in order
    pub fn queries(&self) -> Vec<TrendQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn base_level(&self, term: &str) -> f64 {
        self.levels.get(term).copied().unwrap_or_else(|| {
            let sum: u32 = term.bytes().map(u32::from).sum();
            20.0 + f64::from(sum % 40)
        })
    }

    /// Underlying (unscaled) interest in `term` on `date`
    pub fn interest(&self, term: &str, date: NaiveDate) -> f64 {
        if term.contains(" + ") {
            return term.split(" + ").map(|t| self.interest(t, date)).sum();
        }
        if self.sparse.contains(term) && date.num_days_from_ce() % 3 == 0 {
            return 0.0;
        }

        let yearly = (2.0 * std::f64::consts::PI * f64::from(date.ordinal()) / 365.25).sin();
        let weekday = f64::from(date.weekday().num_days_from_monday());
        let drift = f64::from(date.num_days_from_ce() - 730_000) / 20_000.0;

        self.base_level(term) * (1.0 + 0.25 * yearly) * (1.0 + 0.05 * (weekday - 3.0)) * (1.0 + drift)
    }

    /// Row dates the service would return for a window
    fn rows(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let span = (end - start).num_days();
        if span <= 269 {
            (0..=span).map(|i| start + Duration::days(i)).collect()
        } else if span < 1900 {
            let offset = (7 - i64::from(start.weekday().num_days_from_sunday())) % 7;
            let mut rows = Vec::new();
            let mut d = start + Duration::days(offset);
            while d <= end {
                rows.push(d);
                d += Duration::days(7);
            }
            rows
        } else {
            let mut rows = Vec::new();
            let mut d = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap();
            if d < start {
                d = next_month(d);
            }
            while d <= end {
                rows.push(d);
                d = next_month(d);
            }
            rows
        }
    }
}

fn next_month(d: NaiveDate) -> NaiveDate {
    if d.month() == 12 {
        NaiveDate::from_ymd_opt(d.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(d.year(), d.month() + 1, 1).unwrap()
    }
}

#[async_trait]
impl TrendsSource for SyntheticSource {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        self.queries.lock().unwrap().push(query.clone());

        let index = Self::rows(query.timeframe.start, query.timeframe.end);
        let raw: Vec<Vec<f64>> = query
            .keywords
            .iter()
            .map(|term| index.iter().map(|d| self.interest(term, *d)).collect())
            .collect();
        let peak = raw
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(*v))
            .max(f64::EPSILON);

        let columns = query
            .keywords
            .iter()
            .zip(raw)
            .map(|(term, values)| {
                let scaled = values
                    .into_iter()
                    .map(|v| {
                        let s = v / peak * 100.0;
                        if self.rounded {
                            s.round()
                        } else {
                            s
                        }
                    })
                    .collect();
                (term.clone(), scaled)
            })
            .collect();

        let is_partial = index
            .iter()
            .map(|d| self.partial_from.is_some_and(|p| *d >= p))
            .collect();
        let frame = TrendFrame::from_columns(index, columns)
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(InterestOverTime { frame, is_partial })
    }
}

/// Fails with a rate limit for the first `failures` calls, then delegates
pub struct FlakySource<S> {
    inner: S,
    failures: u32,
    calls: AtomicU32,
}

impl<S> FlakySource<S> {
    pub fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: TrendsSource> TrendsSource for FlakySource<S> {
    async fn interest_over_time(&self, query: &TrendQuery) -> Result<InterestOverTime, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(SourceError::RateLimit);
        }
        self.inner.interest_over_time(query).await
    }
}

/// Relative spread (max - min) / mean of `values`
pub fn relative_spread(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (max - min) / mean
}
