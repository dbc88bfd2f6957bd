use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

use trendex::config::Config;
use trendex::models::{InterestOverTime, Timeframe, TrendQuery};
use trendex::source::{validate_query, validate_response, SnapshotStore};

/// Query identity and the response file to store for it
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Queried terms, comma separated, in query order
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub terms: Vec<String>,

    /// Region code of the query, defaults to the configured region
    #[arg(short, long)]
    pub geo: Option<String>,

    /// First date of the query (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last date of the query (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Interest-over-time JSON document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory of recorded responses
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Query the recorded response answers, as `build` would issue it
fn recorded_query(config: &Config, args: &RecordArgs) -> Result<TrendQuery> {
    let timeframe = Timeframe::new(args.start, args.end)
        .with_context(|| format!("start {} is after end {}", args.start, args.end))?;
    let terms: Vec<String> = args.terms.iter().map(|t| t.trim().to_string()).collect();
    let geo = args.geo.as_ref().unwrap_or(&config.index.geo);
    let query = TrendQuery::new(terms, geo.trim(), timeframe);
    validate_query(&query)?;
    Ok(query)
}

pub async fn record(config: &Config, args: RecordArgs) -> Result<()> {
    let query = recorded_query(config, &args)?;

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let response: InterestOverTime = serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid interest-over-time JSON: {}", args.input.display()))?;
    validate_response(&query, &response)?;

    let dir = args
        .snapshot_dir
        .unwrap_or_else(|| config.source.snapshot_dir.clone());
    let store = SnapshotStore::open(&dir).await?;
    let path = store.save(&query, &response).await?;

    tracing::info!(
        query = %query.canonical(),
        rows = response.frame.len(),
        path = %path.display(),
        "Response recorded"
    );
    println!("Recorded {} rows for [{}] {}", response.frame.len(), query.keywords.join(", "), query.timeframe);
    println!("  Snapshot: {}", path.display());
    Ok(())
}
