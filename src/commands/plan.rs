use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use trendex::config::Config;
use trendex::index::IndexPlan;
use trendex::models::TrendQuery;
use trendex::source::SnapshotStore;

#[derive(Serialize)]
struct QueryStatus {
    terms: Vec<String>,
    timeframe: String,
    fingerprint: String,
    recorded: bool,
}

#[derive(Serialize)]
struct PlanReport {
    plan: IndexPlan,
    benchmark_queries: Vec<QueryStatus>,
    window_queries: Vec<QueryStatus>,
}

async fn status(store: &SnapshotStore, queries: Vec<TrendQuery>) -> Result<Vec<QueryStatus>> {
    let mut statuses = Vec::with_capacity(queries.len());
    for query in queries {
        let recorded = store.load(&query).await?.is_some();
        statuses.push(QueryStatus {
            timeframe: query.timeframe.to_string(),
            fingerprint: query.fingerprint(),
            terms: query.keywords,
            recorded,
        });
    }
    Ok(statuses)
}

pub async fn plan(config: &Config, json: bool) -> Result<()> {
    let settings = config.index_settings();
    let plan = IndexPlan::resolve(&settings, Utc::now().date_naive())?;
    let store = SnapshotStore::open(&config.source.snapshot_dir).await?;

    let benchmark_queries = status(
        &store,
        plan.benchmark_queries(&settings.language, &settings.geo)?,
    )
    .await?;
    let window_queries = status(&store, plan.window_queries(&settings.geo)).await?;

    let report = PlanReport {
        plan,
        benchmark_queries,
        window_queries,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let plan = &report.plan;
    println!("Index plan");
    println!("================================");
    println!("  Timeframe: {} ({} days)", plan.timeframe, plan.timeframe.span_days());
    println!("  Frequency: {}", settings.frequency);
    println!("  Time chunks: {}", plan.timechunks.len());
    for (i, chunk) in plan.timechunks.iter().enumerate() {
        println!("    {:>3}. {chunk}", i + 1);
    }

    match (&plan.search.benchmark, plan.benchmark_pending) {
        (Some(_), true) => println!("  Benchmark: chosen by ranking candidates"),
        (Some(benchmark), false) => println!("  Benchmark: {benchmark}"),
        (None, _) => println!("  Benchmark: none (single query per chunk)"),
    }
    println!("  Search groups: {}", plan.search.groups.len());
    for group in &plan.search.groups {
        println!("    - {}", group.join(", "));
    }

    let all: Vec<&QueryStatus> = report
        .benchmark_queries
        .iter()
        .chain(&report.window_queries)
        .collect();
    let missing = all.iter().filter(|q| !q.recorded).count();
    println!(
        "  Queries: {} ({} recorded, {missing} missing)",
        all.len(),
        all.len() - missing
    );
    if plan.benchmark_pending {
        println!("  (window queries depend on the benchmark and may change after ranking)");
    }
    for query in all.iter().filter(|q| !q.recorded) {
        println!(
            "    missing: [{}] {} -> {}.json",
            query.terms.join(", "),
            query.timeframe,
            query.fingerprint
        );
    }

    Ok(())
}
