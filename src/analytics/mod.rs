//! Time-series building blocks for the trends index
//!
//! - [`frame`] date-indexed tables of interest values
//! - [`resample`] collapsing rows into weeks, months or quarters
//! - [`seasonal`] classical additive decomposition
//! - [`normalize`] z-score and 0–100 scaling

pub mod frame;
pub mod normalize;
pub mod resample;
pub mod seasonal;

pub use frame::{FrameError, Series, TrendFrame};
pub use normalize::Normalization;
pub use resample::{infer_granularity, resample, Granularity, ResampleError};
pub use seasonal::{decompose, seasonally_adjust, Decomposition};
