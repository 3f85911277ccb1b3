use anyhow::Result;
use catalog_feed::config;
use catalog_feed::diff::SnapshotDiff;
use catalog_feed::model::Category;
use catalog_feed::provider::MockDataProvider;
use catalog_feed::section::Section;
use catalog_feed::{CatalogFeed, IndexPath, PageOutcome, Snapshot, Update};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run a scripted catalog session against the mock data source"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Move the recommendations section to this index after loading
    #[arg(long)]
    recommendations_at: Option<usize>,

    /// Fail the first N data source calls
    #[arg(long, default_value = "0")]
    fail_first: usize,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let provider = Arc::new(MockDataProvider::from_config(&cfg));
    provider.fail_next(args.fail_first);
    let feed = CatalogFeed::new(provider, cfg.feed.clone());

    // Retry the initial load the way a user would tap "retry", with backoff.
    let mut attempt = 1;
    loop {
        match feed.load_initial().await {
            Ok(update) => {
                report("initial load", &update);
                break;
            }
            Err(err) if attempt < cfg.retry.max_attempts => {
                let delay = cfg.retry.backoff(attempt);
                warn!(%err, attempt, delay_ms = delay.as_millis() as u64, "initial load failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(%err, attempt, "initial load failed; giving up");
                return Err(err.into());
            }
        }
    }

    // Scroll to the bottom until the feed runs out of pages.
    loop {
        let snapshot = feed.snapshot().await;
        let Some(last) = last_row(&snapshot) else {
            break;
        };
        if !feed.should_load_more(last).await {
            break;
        }
        match feed.load_next_page().await {
            Ok(PageOutcome::Appended { page, appended, diff }) => {
                println!("page {page}: {appended} categories");
                print_diff(&diff);
            }
            Ok(PageOutcome::Exhausted) => {
                println!("no more pages");
                break;
            }
            Ok(outcome) => info!(?outcome, "page request skipped"),
            Err(err) => error!(%err, "page request failed"),
        }
    }

    match feed.reload().await {
        Ok(update) => report("refresh", &update),
        Err(err) => error!(%err, "refresh failed"),
    }

    if let Some(index) = args.recommendations_at {
        let diff = feed.move_recommendations(index).await;
        println!("moved recommendations to {index}");
        print_diff(&diff);
    }

    let snapshot = feed.snapshot().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot, &feed.categories().await);
    }
    Ok(())
}

fn last_row(snapshot: &Snapshot) -> Option<IndexPath> {
    let section = snapshot.number_of_sections().checked_sub(1)?;
    let row = snapshot.number_of_rows(section).saturating_sub(1);
    Some(IndexPath::new(section, row))
}

fn report(label: &str, update: &Update) {
    match update {
        Update::Applied(diff) => {
            println!("{label}:");
            print_diff(diff);
        }
        Update::Stale => println!("{label}: superseded by a newer response"),
    }
}

fn print_diff(diff: &SnapshotDiff) {
    let c = diff.change_counts();
    println!(
        "  sections +{} -{}, rows +{} -{}",
        c.sections_inserted, c.sections_deleted, c.rows_inserted, c.rows_deleted
    );
}

fn print_snapshot(snapshot: &Snapshot, categories: &[Category]) {
    for (index, section) in snapshot.sections().iter().enumerate() {
        let label = match section.section {
            Section::Banner => "banners".to_string(),
            Section::Category(id) => categories
                .iter()
                .find(|c| c.id == id)
                .map_or_else(|| format!("category {id}"), |c| c.name.clone()),
            Section::Recommendations => "recommendations".to_string(),
        };
        println!("[{index}] {label} ({} rows)", section.rows.len());
        for row in &section.rows {
            println!("    {}", row.title());
        }
    }
}
