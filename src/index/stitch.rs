//! Stitching overlapping windows into one continuous frame
//!
//! Every window is scaled to its own peak, so a later window is rescaled per
//! term to match the rows already stitched over the dates they share, and
//! only its rows past the current end are appended.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::analytics::{FrameError, TrendFrame};
use crate::utils::error::IndexError;

/// How the per-term factor is computed over the overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StitchMethod {
    /// `mean(earlier) / mean(later)`
    #[default]
    RatioOfMeans,
    /// `mean(earlier / later)`, row by row
    MeanOfRatios,
}

impl fmt::Display for StitchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RatioOfMeans => f.write_str("ratio_of_means"),
            Self::MeanOfRatios => f.write_str("mean_of_ratios"),
        }
    }
}

impl FromStr for StitchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ratio_of_means" => Ok(Self::RatioOfMeans),
            "mean_of_ratios" => Ok(Self::MeanOfRatios),
            other => Err(format!("unknown stitch method: {other}")),
        }
    }
}

impl StitchMethod {
    /// Factor bringing `later` onto the scale of `earlier`
    ///
    /// Both slices cover the same dates. Zeros count as 1.
    #[must_use]
    pub fn factor(self, earlier: &[f64], later: &[f64]) -> f64 {
        let lift = |v: &f64| if *v == 0.0 { 1.0 } else { *v };
        match self {
            Self::RatioOfMeans => {
                earlier.iter().map(lift).mean() / later.iter().map(lift).mean()
            }
            Self::MeanOfRatios => earlier
                .iter()
                .zip(later)
                .map(|(a, b)| lift(a) / lift(b))
                .mean(),
        }
    }
}

/// Factors applied to one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkAdjustment {
    /// Window position, starting at 1
    pub chunk: usize,

    /// Dates shared with the rows stitched before it
    pub overlap_rows: usize,

    /// Rows this window added
    pub appended_rows: usize,

    /// Per-term scale factor
    pub factors: BTreeMap<String, f64>,
}

/// Accumulates windows in date order
#[derive(Debug, Clone)]
pub struct Stitcher {
    method: StitchMethod,
    frame: Option<TrendFrame>,
    adjustments: Vec<ChunkAdjustment>,
    pushed: usize,
}

impl Stitcher {
    #[must_use]
    pub fn new(method: StitchMethod) -> Self {
        Self {
            method,
            frame: None,
            adjustments: Vec::new(),
            pushed: 0,
        }
    }

    /// Add the next window
    ///
    /// The first window is taken as is. Later windows must share at least one
    /// date with the rows stitched so far.
    pub fn push(&mut self, chunk: &TrendFrame) -> Result<(), IndexError> {
        let position = self.pushed;
        self.pushed += 1;

        let Some(frame) = self.frame.as_mut() else {
            self.frame = Some(chunk.clone());
            return Ok(());
        };

        let pairs = frame.aligned_rows(chunk);
        if pairs.is_empty() {
            return Err(IndexError::NoOverlap { chunk: position });
        }

        let mut scaled = chunk.clone();
        let mut factors = BTreeMap::new();
        for (name, later) in chunk.columns() {
            let earlier = frame
                .column(name)
                .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))?;
            let lhs: Vec<f64> = pairs.iter().map(|&(i, _)| earlier[i]).collect();
            let rhs: Vec<f64> = pairs.iter().map(|&(_, j)| later[j]).collect();

            let factor = self.method.factor(&lhs, &rhs);
            scaled.scale_column(name, factor)?;
            factors.insert(name.to_string(), factor);
        }

        let appended_rows = frame.append_after(&scaled)?;
        debug!(
            chunk = position,
            overlap = pairs.len(),
            appended = appended_rows,
            "Window stitched"
        );

        self.adjustments.push(ChunkAdjustment {
            chunk: position,
            overlap_rows: pairs.len(),
            appended_rows,
            factors,
        });
        Ok(())
    }

    /// Stitched frame and the factors used for every window after the first
    #[must_use]
    pub fn finish(self) -> (TrendFrame, Vec<ChunkAdjustment>) {
        (self.frame.unwrap_or_default(), self.adjustments)
    }
}

/// Stitch `chunks` in order
pub fn stitch(
    chunks: &[TrendFrame],
    method: StitchMethod,
) -> Result<(TrendFrame, Vec<ChunkAdjustment>), IndexError> {
    let mut stitcher = Stitcher::new(method);
    for chunk in chunks {
        stitcher.push(chunk)?;
    }
    Ok(stitcher.finish())
}
