//! Index normalisation
//!
//! The composite index is reported either as a z-score or rescaled onto
//! 0–100, the range the source itself uses for interest values.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

use super::frame::Series;

/// How the summed series is turned into the published index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Min-max onto 0..=100
    #[default]
    Scale100,
    /// `(x - mean) / sample std`
    Zscore,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scale100 => f.write_str("scale100"),
            Self::Zscore => f.write_str("zscore"),
        }
    }
}

impl FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scale100" | "0-100" => Ok(Self::Scale100),
            "zscore" | "z" => Ok(Self::Zscore),
            other => Err(format!("unknown normalization: {other}")),
        }
    }
}

impl Normalization {
    #[must_use]
    pub fn apply(self, series: &Series) -> Series {
        let values = match self {
            Self::Scale100 => scale_100(&series.values),
            Self::Zscore => zscore(&series.values),
        };
        series.with_values(values)
    }
}

/// Standardise to zero mean and unit sample standard deviation
///
/// A constant (or single-point) series maps to all zeros.
#[must_use]
pub fn zscore(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().mean();
    let std_dev = values.iter().std_dev();

    if !std_dev.is_finite() || std_dev == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / std_dev).collect()
}

/// Min-max rescale onto 0..=100
///
/// A constant series maps to all 50s.
#[must_use]
pub fn scale_100(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 || !range.is_finite() {
        return vec![50.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range * 100.0).collect()
}
