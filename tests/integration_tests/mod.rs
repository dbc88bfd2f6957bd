//! Integration tests module
//!
//! End-to-end tests of index construction:
//! - Windows pulled, stitched, resampled and normalised into the index
//! - Responses recorded to a snapshot store and replayed
//! - Error handling for weak benchmarks, bad input and missing data

pub mod error_scenarios;
pub mod pipeline_test;
pub mod snapshot_test;
