use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use trendex::config::Config;
use trendex::error::{Error, TrendexErrorTrait};
use trendex::index::{IndexOutput, Trendex};
use trendex::source::{PacedSource, SnapshotSource, SnapshotStore, TrendsSource};

pub async fn build(config: &Config, output_path: Option<PathBuf>, paced: bool) -> Result<()> {
    let store = SnapshotStore::open(&config.source.snapshot_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to open snapshot directory: {}",
                config.source.snapshot_dir.display()
            )
        })?;
    let replay = SnapshotSource::new(store);

    let source: Box<dyn TrendsSource> = if paced {
        Box::new(PacedSource::new(
            replay,
            config.source.requests_per_minute,
            config.pacing(),
            config.retry(),
        ))
    } else {
        Box::new(replay)
    };

    let today = Utc::now().date_naive();
    let result = async {
        let trendex = Trendex::new(config.index_settings(), source, today).await?;
        trendex.make_index().await
    }
    .await;
    let output = result.map_err(|e| {
        let err = Error::from(e);
        tracing::error!(
            category = err.category().description(),
            recoverable = err.is_recoverable(),
            "Index build failed: {err}"
        );
        err
    })?;

    let json = serde_json::to_string_pretty(&output)?;
    match output_path {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            print_summary(&output);
            println!("  Output: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn print_summary(output: &IndexOutput) {
    println!("Index built");
    println!("================================");
    println!("  Keywords: {}", output.keywords.join(", "));
    println!("  Region: {}", if output.geo.is_empty() { "worldwide" } else { output.geo.as_str() });
    println!("  Timeframe: {}", output.timeframe);
    println!("  Frequency: {}", output.frequency);
    println!("  Time chunks: {}", output.timechunks.len());
    if let Some(benchmark) = &output.benchmark {
        println!("  Benchmark: {benchmark} ({} search groups)", output.search_groups.len());
    }
    println!("  Seasonally adjusted: {}", output.seasonally_adjusted);
    println!("  Points: {}", output.gti.len());
    if let (Some(first), Some(last)) = (output.gti.index.first(), output.gti.index.last()) {
        println!("  Range: {first} .. {last}");
    }
}
