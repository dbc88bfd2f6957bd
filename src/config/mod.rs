//! Configuration management for trendex
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Command-line flags override individual values.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::analytics::Normalization;
use crate::index::{IndexSettings, StitchMethod};
use crate::models::{Frequency, Language};
use crate::source::Pacing;
use crate::utils::parse_optional_date;
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to build
    pub index: IndexConfig,

    /// How the trends source is queried
    pub source: SourceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Search terms
    pub keywords: Vec<String>,

    /// Region code (e.g. "US"), empty for worldwide
    pub geo: String,

    /// Language of the keywords (en, es)
    pub language: Language,

    /// First date (YYYY-MM-DD)
    pub date_start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD), defaults to today
    pub date_end: Option<NaiveDate>,

    /// Output frequency
    pub frequency: Frequency,

    /// Seasonally adjust the index
    pub seasonal_adjust: bool,

    /// Fold long keyword lists into OR-terms
    pub split_keywords: bool,

    /// Rank benchmark candidates instead of using the first keyword
    pub select_benchmark: bool,

    /// Index scale (scale100, zscore)
    pub normalization: Normalization,

    /// Overlap factor (ratio_of_means, mean_of_ratios)
    pub stitch: StitchMethod,
}

/// Trends source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of recorded responses
    pub snapshot_dir: PathBuf,

    /// Query quota per minute
    pub requests_per_minute: u32,

    /// Pause randomly between queries
    pub slowdown: bool,

    /// Shortest pause in milliseconds
    pub min_delay_ms: u64,

    /// Longest pause in milliseconds
    pub max_delay_ms: u64,

    /// Retries on recoverable errors
    pub max_retries: u32,

    /// First backoff delay in milliseconds
    pub retry_base_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub retry_max_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults, except dates,
    /// which must be valid when set.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let keywords = std::env::var("TRENDEX_KEYWORDS")
            .map(|v| {
                v.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.index.keywords);

        let geo = std::env::var("TRENDEX_GEO").unwrap_or(defaults.index.geo);

        let language = std::env::var("TRENDEX_LANG")
            .map(Language::from)
            .unwrap_or(defaults.index.language);

        let date_start = parse_optional_date(std::env::var("TRENDEX_DATE_START").ok().as_deref())
            .context("TRENDEX_DATE_START")?;
        let date_end = parse_optional_date(std::env::var("TRENDEX_DATE_END").ok().as_deref())
            .context("TRENDEX_DATE_END")?;

        let snapshot_dir = std::env::var("TRENDEX_SNAPSHOT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.source.snapshot_dir);

        let log_level =
            std::env::var("TRENDEX_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("TRENDEX_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            index: IndexConfig {
                keywords,
                geo,
                language,
                date_start,
                date_end,
                frequency: env_parse("TRENDEX_FREQUENCY").unwrap_or(defaults.index.frequency),
                seasonal_adjust: env_bool("TRENDEX_SEASONAL_ADJUST")
                    .unwrap_or(defaults.index.seasonal_adjust),
                split_keywords: env_bool("TRENDEX_SPLIT_KEYWORDS")
                    .unwrap_or(defaults.index.split_keywords),
                select_benchmark: env_bool("TRENDEX_BENCHMARK_SELECT")
                    .unwrap_or(defaults.index.select_benchmark),
                normalization: env_parse("TRENDEX_NORMALIZATION")
                    .unwrap_or(defaults.index.normalization),
                stitch: env_parse("TRENDEX_STITCH").unwrap_or(defaults.index.stitch),
            },
            source: SourceConfig {
                snapshot_dir,
                requests_per_minute: env_parse("TRENDEX_RATE_LIMIT")
                    .unwrap_or(defaults.source.requests_per_minute),
                slowdown: env_bool("TRENDEX_SLOWDOWN").unwrap_or(defaults.source.slowdown),
                max_retries: env_parse("TRENDEX_MAX_RETRIES")
                    .unwrap_or(defaults.source.max_retries),
                ..defaults.source
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.index.keywords.iter().all(|k| k.trim().is_empty()) {
            anyhow::bail!("at least one keyword is required");
        }

        if let (Some(start), Some(end)) = (self.index.date_start, self.index.date_end) {
            if start > end {
                anyhow::bail!("date_start ({start}) is after date_end ({end})");
            }
        }

        if self.index.select_benchmark && self.index.language.anchor_term().is_none() {
            anyhow::bail!(
                "benchmark selection supports languages en and es, got '{}'",
                self.index.language.code()
            );
        }

        if self.source.requests_per_minute == 0 {
            anyhow::bail!("requests_per_minute must be greater than 0");
        }

        if self.source.min_delay_ms > self.source.max_delay_ms {
            anyhow::bail!("min_delay_ms must not exceed max_delay_ms");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Index settings described by this configuration
    #[must_use]
    pub fn index_settings(&self) -> IndexSettings {
        let index = &self.index;
        IndexSettings {
            keywords: index.keywords.clone(),
            geo: index.geo.clone(),
            language: index.language.clone(),
            date_start: index.date_start,
            date_end: index.date_end,
            frequency: index.frequency,
            seasonal_adjust: index.seasonal_adjust,
            split_keywords: index.split_keywords,
            select_benchmark: index.select_benchmark,
            normalization: index.normalization,
            stitch: index.stitch,
        }
    }

    #[must_use]
    pub fn pacing(&self) -> Pacing {
        Pacing {
            slowdown: self.source.slowdown,
            min_delay_ms: self.source.min_delay_ms,
            max_delay_ms: self.source.max_delay_ms,
        }
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_delays(
            self.source.max_retries,
            self.source.retry_base_delay_ms,
            self.source.retry_max_delay_ms,
        )
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            keywords: ["flu", "epidemic", "pandemic", "outbreak", "disease", "sickness"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            geo: String::from("US"),
            language: Language::En,
            date_start: None,
            date_end: None,
            frequency: Frequency::Daily,
            seasonal_adjust: true,
            split_keywords: true,
            select_benchmark: true,
            normalization: Normalization::default(),
            stitch: StitchMethod::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        let pacing = Pacing::default();
        let retry = RetryConfig::default();
        Self {
            snapshot_dir: PathBuf::from("data/snapshots"),
            requests_per_minute: 10,
            slowdown: pacing.slowdown,
            min_delay_ms: pacing.min_delay_ms,
            max_delay_ms: pacing.max_delay_ms,
            max_retries: retry.max_retries,
            retry_base_delay_ms: retry.base_delay_ms,
            retry_max_delay_ms: retry.max_delay_ms,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}
