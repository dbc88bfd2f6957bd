//! Benchmark term selection
//!
//! A query holds at most five terms and every query is scaled to its own
//! peak, so lists longer than five are searched in groups that all contain
//! one shared benchmark term. The benchmark's overlap is what puts the groups
//! on a common scale, which makes a term with steady, non-zero interest
//! across the whole range the best choice.

use chrono::Datelike;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::keywords::search_groups;
use crate::analytics::TrendFrame;
use crate::models::{Language, Timeframe, TrendQuery, MAX_QUERY_TERMS};
use crate::source::TrendsSource;
use crate::utils::error::IndexError;

/// Keywords in query order, the benchmark (if any) and the query groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPlan {
    /// Keywords with the benchmark moved to the front
    pub keywords: Vec<String>,

    /// Term shared by every group, absent when one query suffices
    pub benchmark: Option<String>,

    /// Terms of each query
    pub groups: Vec<Vec<String>>,
}

impl SearchPlan {
    /// Every keyword in one query
    #[must_use]
    pub fn single(keywords: Vec<String>) -> Self {
        Self {
            groups: vec![keywords.clone()],
            keywords,
            benchmark: None,
        }
    }

    /// Groups led by `benchmark`, which is moved to the front of the list
    #[must_use]
    pub fn with_benchmark(mut keywords: Vec<String>, benchmark: &str) -> Self {
        if let Some(pos) = keywords.iter().position(|k| k == benchmark) {
            let term = keywords.remove(pos);
            keywords.insert(0, term);
        } else {
            keywords.insert(0, benchmark.to_string());
        }
        let groups = search_groups(&keywords, MAX_QUERY_TERMS);
        Self {
            benchmark: Some(benchmark.to_string()),
            keywords,
            groups,
        }
    }
}

/// Ranking statistics of one benchmark candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkScore {
    pub term: String,

    /// Calendar years whose mean interest is non-zero
    pub nonzero_years: usize,

    /// Mean interest over the whole range
    pub mean: f64,
}

/// Decide how `keywords` are searched
///
/// Up to five keywords go in a single query. Longer lists need a benchmark:
/// the first keyword, or the best-ranked one when `select` is set.
pub async fn plan_searches<S>(
    source: &S,
    keywords: &[String],
    select: bool,
    language: &Language,
    geo: &str,
    timeframe: Timeframe,
) -> Result<SearchPlan, IndexError>
where
    S: TrendsSource + ?Sized,
{
    let Some(first) = keywords.first() else {
        return Err(IndexError::NoKeywords);
    };
    if keywords.len() <= MAX_QUERY_TERMS {
        return Ok(SearchPlan::single(keywords.to_vec()));
    }

    let benchmark = if select {
        optimal_benchmark(source, keywords, language, geo, timeframe).await?
    } else {
        first.clone()
    };
    info!(benchmark = %benchmark, selected = select, "Benchmark term chosen");

    Ok(SearchPlan::with_benchmark(keywords.to_vec(), &benchmark))
}

/// Query every keyword next to a popular anchor term and pick the steadiest
///
/// The anchor (`football` for English, `fútbol` for Spanish) gives every
/// group the same reference so the candidates' means are comparable.
pub async fn optimal_benchmark<S>(
    source: &S,
    keywords: &[String],
    language: &Language,
    geo: &str,
    timeframe: Timeframe,
) -> Result<String, IndexError>
where
    S: TrendsSource + ?Sized,
{
    let (anchor, groups) = candidate_groups(keywords, language)?;

    let mut candidates: Option<TrendFrame> = None;
    for group in groups {
        let query = TrendQuery::new(group.clone(), geo, timeframe);
        let response = source.interest_over_time(&query).await?;
        let frame = response.complete_rows().select(&group)?.without_column(anchor);

        candidates = Some(match candidates {
            None => frame,
            Some(acc) => acc.join_columns(&frame)?,
        });
    }

    let candidates = candidates.unwrap_or_default();
    let ranked = rank_candidates(&candidates);
    for score in &ranked {
        debug!(
            term = %score.term,
            nonzero_years = score.nonzero_years,
            mean = score.mean,
            "Benchmark candidate"
        );
    }

    ranked
        .into_iter()
        .next()
        .map(|best| best.term)
        .ok_or_else(|| IndexError::EmptyWindow(timeframe.to_string()))
}

/// Anchor term and the query groups used to rank `keywords`
pub fn candidate_groups(
    keywords: &[String],
    language: &Language,
) -> Result<(&'static str, Vec<Vec<String>>), IndexError> {
    let anchor = language
        .anchor_term()
        .ok_or_else(|| IndexError::UnsupportedLanguage(language.code().to_string()))?;

    let mut terms = vec![anchor.to_string()];
    terms.extend(keywords.iter().filter(|k| k.as_str() != anchor).cloned());
    Ok((anchor, search_groups(&terms, MAX_QUERY_TERMS)))
}

/// Rank columns by non-zero calendar years, then by overall mean
///
/// Both keys sort descending. Ties keep column order.
#[must_use]
pub fn rank_candidates(frame: &TrendFrame) -> Vec<BenchmarkScore> {
    let mut scores: Vec<BenchmarkScore> = frame
        .columns()
        .map(|(term, values)| {
            let mut years: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
            for (date, v) in frame.index().iter().zip(values) {
                let entry = years.entry(date.year()).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
            let nonzero_years = years
                .values()
                .filter(|(sum, count)| sum / *count as f64 != 0.0)
                .count();

            BenchmarkScore {
                term: term.to_string(),
                nonzero_years,
                mean: values.iter().mean(),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.nonzero_years
            .cmp(&a.nonzero_years)
            .then_with(|| b.mean.partial_cmp(&a.mean).unwrap_or(Ordering::Equal))
    });
    scores
}
