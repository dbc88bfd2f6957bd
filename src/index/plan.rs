//! Date range resolution and time chunking
//!
//! The source returns daily rows only for windows of at most ~270 days and
//! monthly rows only for windows longer than ~5 years. Long daily or weekly
//! indices are therefore queried as overlapping windows that are stitched
//! back together afterwards.

use chrono::{Duration, NaiveDate};

use crate::models::{Frequency, Timeframe, DATE_FORMAT};
use crate::utils::error::IndexError;

/// Longest window (in days) that still yields daily rows
pub const CUTOFF_DAILY: i64 = 260;

/// Default lookback (in days) for monthly and quarterly indices
pub const CUTOFF_MONTHLY: i64 = 270 * 7 + 10;

/// Days shared by consecutive windows
pub const OVERLAP: i64 = 45;

/// Shortest window (in days) for which the source returns monthly rows
pub const MIN_MONTHLY_SPAN: i64 = 2000;

/// Resolve the queried date range from optional user dates
///
/// `end` defaults to `today`. Daily and weekly indices default to the last
/// [`CUTOFF_DAILY`] days. Monthly and quarterly indices default to the last
/// [`CUTOFF_MONTHLY`] days, and a user start closer than
/// [`MIN_MONTHLY_SPAN`] days to `end` is moved back so the source returns
/// monthly rows.
pub fn resolve_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    frequency: Frequency,
    today: NaiveDate,
) -> Result<Timeframe, IndexError> {
    let end = end.unwrap_or(today);

    let start = if frequency.uses_daily_rows() {
        start.unwrap_or(end - Duration::days(CUTOFF_DAILY))
    } else {
        match start {
            None => end - Duration::days(CUTOFF_MONTHLY),
            Some(s) if (end - s).num_days() < MIN_MONTHLY_SPAN => {
                end - Duration::days(MIN_MONTHLY_SPAN)
            }
            Some(s) => s,
        }
    };

    Timeframe::new(start, end).ok_or_else(|| IndexError::InvalidDateRange {
        start: start.format(DATE_FORMAT).to_string(),
        end: end.format(DATE_FORMAT).to_string(),
    })
}

/// Split a timeframe into overlapping windows of [`CUTOFF_DAILY`] days
///
/// Window `i` starts `i * (CUTOFF_DAILY - OVERLAP)` days after the start and
/// no window runs past the timeframe's end, so the last one may be shorter.
/// A timeframe no longer than [`CUTOFF_DAILY`] days is a single window.
#[must_use]
pub fn timechunks(timeframe: Timeframe) -> Vec<Timeframe> {
    let span = timeframe.span_days();
    if span <= CUTOFF_DAILY {
        return vec![timeframe];
    }

    let step = CUTOFF_DAILY - OVERLAP;
    let mut chunks = Vec::with_capacity((span / step) as usize + 1);
    let mut from = 0;
    loop {
        let to = (from + CUTOFF_DAILY).min(span);
        chunks.push(Timeframe {
            start: timeframe.start + Duration::days(from),
            end: timeframe.start + Duration::days(to),
        });
        if to == span {
            break;
        }
        from += step;
    }
    chunks
}

/// Windows queried for `frequency` over `timeframe`
#[must_use]
pub fn windows_for(frequency: Frequency, timeframe: Timeframe) -> Vec<Timeframe> {
    if frequency.uses_daily_rows() {
        timechunks(timeframe)
    } else {
        vec![timeframe]
    }
}
