// Core data structures for trendex

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::analytics::frame::TrendFrame;

/// Date format used by the trends source and in configuration
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum number of terms a single query may carry
pub const MAX_QUERY_TERMS: usize = 5;

/// Output frequency of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Whether the index is assembled from daily rows over stitched windows
    #[must_use]
    pub fn uses_daily_rows(self) -> bool {
        matches!(self, Self::Daily | Self::Weekly)
    }

    /// Number of observations per seasonal cycle
    #[must_use]
    pub fn seasonal_period(self) -> usize {
        match self {
            Self::Daily => 7,
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::Quarterly => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Language of the keyword list, used to pick the benchmark anchor term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    En,
    Es,
    Other(String),
}

impl Language {
    /// Popular term searched next to the candidates during benchmark selection
    #[must_use]
    pub fn anchor_term(&self) -> Option<&'static str> {
        match self {
            Self::En => Some("football"),
            Self::Es => Some("fútbol"),
            Self::Other(_) => None,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Other(code) => code,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "en" => Self::En,
            "es" => Self::Es,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Inclusive date window queried from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Timeframe {
    /// Create a timeframe, returning `None` when `start` is after `end`
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Length of the window in days (end - start)
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// One request against the trends source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrendQuery {
    pub keywords: Vec<String>,
    pub geo: String,
    pub timeframe: Timeframe,
}

impl TrendQuery {
    pub fn new(keywords: Vec<String>, geo: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            keywords,
            geo: geo.into(),
            timeframe,
        }
    }

    /// Canonical textual form, stable across runs and used in log events
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}",
            self.keywords.join(","),
            self.geo,
            self.timeframe
        )
    }

    /// SHA256 over the length-prefixed query fields, used as the snapshot key
    ///
    /// Terms may contain the separators of [`canonical`](Self::canonical), so
    /// the key hashes every field with its byte length in front.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fn field(hasher: &mut Sha256, value: &str) {
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        let mut hasher = Sha256::new();
        hasher.update((self.keywords.len() as u64).to_le_bytes());
        for keyword in &self.keywords {
            field(&mut hasher, keyword);
        }
        field(&mut hasher, &self.geo);
        field(&mut hasher, &self.timeframe.to_string());
        format!("{:x}", hasher.finalize())
    }
}

/// Interest-over-time response for one query
///
/// Rows flagged partial cover a period the source has not finished
/// collecting and are dropped before any scaling happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestOverTime {
    pub frame: TrendFrame,
    pub is_partial: Vec<bool>,
}

impl InterestOverTime {
    /// Wrap a frame with no partial rows
    #[must_use]
    pub fn complete(frame: TrendFrame) -> Self {
        let is_partial = vec![false; frame.len()];
        Self { frame, is_partial }
    }

    /// Frame without partial rows
    #[must_use]
    pub fn complete_rows(&self) -> TrendFrame {
        self.frame
            .filter_rows(|i, _| !self.is_partial.get(i).copied().unwrap_or(false))
    }
}
