//! Query one time window for every keyword
//!
//! With a benchmark, each search group is queried separately and rescaled so
//! its benchmark column matches the first group's; the groups' other columns
//! are then joined into one frame.

use statrs::statistics::Statistics;
use tracing::{debug, warn};

use super::benchmark::SearchPlan;
use super::keywords::{too_small, TOO_SMALL_TOLERANCE};
use crate::analytics::TrendFrame;
use crate::models::{Timeframe, TrendQuery};
use crate::source::TrendsSource;
use crate::utils::error::{IndexError, SourceError};

/// Pull `timeframe` for all keywords of `plan` as one frame
///
/// A weak benchmark (any zero, or too many ones) aborts the pull when the
/// benchmark was not selected automatically. A selected benchmark is the best
/// available, so it is only reported.
pub async fn pull_timeframe<S>(
    source: &S,
    plan: &SearchPlan,
    geo: &str,
    timeframe: Timeframe,
    benchmark_selected: bool,
) -> Result<TrendFrame, IndexError>
where
    S: TrendsSource + ?Sized,
{
    let frame = match &plan.benchmark {
        Some(benchmark) => {
            pull_groups(source, plan, benchmark, geo, timeframe, benchmark_selected).await?
        }
        None => {
            let query = TrendQuery::new(plan.keywords.clone(), geo, timeframe);
            let response = source.interest_over_time(&query).await?;
            response.complete_rows().select(&plan.keywords)?
        }
    };

    if frame.is_empty() {
        return Err(IndexError::EmptyWindow(timeframe.to_string()));
    }
    Ok(frame)
}

async fn pull_groups<S>(
    source: &S,
    plan: &SearchPlan,
    benchmark: &str,
    geo: &str,
    timeframe: Timeframe,
    benchmark_selected: bool,
) -> Result<TrendFrame, IndexError>
where
    S: TrendsSource + ?Sized,
{
    let mut weak = false;
    let mut frame: Option<TrendFrame> = None;

    for (idx, group) in plan.groups.iter().enumerate() {
        let query = TrendQuery::new(group.clone(), geo, timeframe);
        let response = source.interest_over_time(&query).await?;

        let bench = response
            .frame
            .column(benchmark)
            .ok_or_else(|| SourceError::MissingTerm(benchmark.to_string()))?;
        if too_small(bench, TOO_SMALL_TOLERANCE) {
            if !benchmark_selected {
                return Err(IndexError::WeakBenchmark {
                    term: benchmark.to_string(),
                    start: timeframe.start.to_string(),
                    end: timeframe.end.to_string(),
                });
            }
            weak = true;
        }

        let mut df = response.complete_rows().select(group)?;
        df.map_column(benchmark, |v| if v == 0.0 { 1.0 } else { v })?;

        frame = Some(match frame {
            None => df,
            Some(base) => {
                let factor = benchmark_factor(&base, &df, benchmark)
                    .ok_or_else(|| IndexError::EmptyWindow(timeframe.to_string()))?;
                debug!(group = idx, factor, "Rescaling search group onto benchmark");
                df.scale_all(factor);
                base.join_columns(&df.without_column(benchmark))?
            }
        });
    }

    if weak {
        warn!(
            benchmark = %benchmark,
            start = %timeframe.start,
            end = %timeframe.end,
            "Benchmark term is the best available but performs poorly in this window"
        );
    }
    Ok(frame.unwrap_or_default())
}

/// Mean of `base[benchmark] / group[benchmark]` over the shared dates
fn benchmark_factor(base: &TrendFrame, group: &TrendFrame, benchmark: &str) -> Option<f64> {
    let lhs = base.column(benchmark)?;
    let rhs = group.column(benchmark)?;
    let pairs = base.aligned_rows(group);
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.iter().map(|&(i, j)| lhs[i] / rhs[j]).mean())
}
