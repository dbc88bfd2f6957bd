//! Collapse stitched rows into a coarser output frequency
//!
//! Buckets are averaged and only complete buckets are kept, so a partial
//! first or last week never drags the index down.

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

use super::frame::{FrameError, TrendFrame};
use crate::models::Frequency;

/// Minimum daily rows for a quarter built from daily data (three Februaries)
const MIN_DAILY_ROWS_PER_QUARTER: usize = 28 * 3;

#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("Cannot build {target} rows from {from:?} rows")]
    Unsupported {
        from: Granularity,
        target: Frequency,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Spacing of the rows returned by the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    /// Some other regular step, in days
    Irregular(i64),
}

impl Granularity {
    fn from_step_days(days: i64) -> Self {
        match days {
            1 => Self::Daily,
            7 => Self::Weekly,
            28..=31 => Self::Monthly,
            other => Self::Irregular(other),
        }
    }
}

/// Infer the row spacing from the lower median of adjacent date gaps
///
/// Returns `None` for fewer than two rows.
#[must_use]
pub fn infer_granularity(index: &[NaiveDate]) -> Option<Granularity> {
    let mut gaps: Vec<i64> = index
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|d| *d > 0)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_unstable();
    let lower_median = gaps[(gaps.len() - 1) / 2];
    Some(Granularity::from_step_days(lower_median))
}

/// Monday of the week containing `date`
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the calendar quarter containing `date`
#[must_use]
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// Number of days in the month starting at `first`
#[must_use]
pub fn days_in_month(first: NaiveDate) -> usize {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map_or(31, |n| (n - first).num_days() as usize)
}

/// Granularity assumed for a lone row, which has no gap to infer from
///
/// Weekly output is built from daily rows. Monthly and quarterly output come
/// from monthly rows when the row sits on the first of a month.
fn single_row_granularity(date: NaiveDate, target: Frequency) -> Granularity {
    if target.uses_daily_rows() || date.day() != 1 {
        Granularity::Daily
    } else {
        Granularity::Monthly
    }
}

/// Resample `frame` to `target`, averaging complete buckets
///
/// # Errors
///
/// Returns [`ResampleError::Unsupported`] when the rows are coarser than the
/// target or cannot be bucketed into it.
pub fn resample(frame: &TrendFrame, target: Frequency) -> Result<TrendFrame, ResampleError> {
    let granularity = match (infer_granularity(frame.index()), frame.index().first()) {
        (Some(granularity), _) => granularity,
        (None, None) => return Ok(frame.clone()),
        (None, Some(_)) if target == Frequency::Daily => return Ok(frame.clone()),
        (None, Some(first)) => single_row_granularity(*first, target),
    };

    match (target, granularity) {
        (Frequency::Daily, Granularity::Daily)
        | (Frequency::Weekly, Granularity::Weekly)
        | (Frequency::Monthly, Granularity::Monthly) => Ok(frame.clone()),

        (Frequency::Weekly, Granularity::Daily) => {
            resample_by(frame, week_start, |_, count| count == 7)
        }
        (Frequency::Monthly, Granularity::Daily) => {
            resample_by(frame, month_start, |bucket, count| count == days_in_month(bucket))
        }
        (Frequency::Quarterly, Granularity::Monthly) => {
            resample_by(frame, quarter_start, |_, count| count == 3)
        }
        (Frequency::Quarterly, Granularity::Daily) => resample_by(frame, quarter_start, |_, count| {
            count >= MIN_DAILY_ROWS_PER_QUARTER
        }),

        (target, from) => Err(ResampleError::Unsupported { from, target }),
    }
}

/// Group sorted rows by `bucket_of`, keep buckets accepted by `complete`, and
/// average each column within a bucket
fn resample_by<B, C>(frame: &TrendFrame, bucket_of: B, complete: C) -> Result<TrendFrame, ResampleError>
where
    B: Fn(NaiveDate) -> NaiveDate,
    C: Fn(NaiveDate, usize) -> bool,
{
    // (bucket, first row, row count)
    let mut groups: Vec<(NaiveDate, usize, usize)> = Vec::new();
    for (i, date) in frame.index().iter().enumerate() {
        let bucket = bucket_of(*date);
        match groups.last_mut() {
            Some((b, _, count)) if *b == bucket => *count += 1,
            _ => groups.push((bucket, i, 1)),
        }
    }
    groups.retain(|(bucket, _, count)| complete(*bucket, *count));

    let index: Vec<NaiveDate> = groups.iter().map(|(b, _, _)| *b).collect();
    let columns = frame
        .columns()
        .map(|(name, values)| {
            let means = groups
                .iter()
                .map(|(_, start, count)| {
                    values[*start..*start + *count].iter().sum::<f64>() / *count as f64
                })
                .collect();
            (name.to_string(), means)
        })
        .collect();

    Ok(TrendFrame::from_columns(index, columns)?)
}
