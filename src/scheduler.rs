use anyhow::Result;
use diesel::sqlite::SqliteConnection;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info};
use std::future::Future;
use std::time::Duration;

use crate::db;
use crate::models::NewVideo;
use crate::scraper::{self, ScrapeError};

/// Outcome of one pass over the tracked queries.
#[derive(Debug, Default, PartialEq)]
pub struct PassSummary {
    pub scraped: usize,
    pub failed: usize,
}

/// One pass over every tracked query, in the order they were added.
pub async fn run_tracker(conn: &mut SqliteConnection, mp: &MultiProgress) -> Result<()> {
    let queries = db::get_tracked_queries(conn)?;
    if queries.is_empty() {
        println!("\n  No tracked queries. Add one with: ytrack track \"query\"\n");
        return Ok(());
    }

    info!("Tracker started for {} query/queries.", queries.len());
    let pb = mp.add(ProgressBar::new(queries.len() as u64));
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>2}/{len:2} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let summary = run_pass(conn, &queries, &pb, |q| async move {
        scraper::scrape_youtube(&q).await
    })
    .await;

    pb.finish_and_clear();
    info!(
        "Tracker run complete: {} scraped, {} failed.",
        summary.scraped, summary.failed
    );
    Ok(())
}

/// Sequentially scrape-and-persist each query. A query whose scrape or save
/// fails is logged and skipped; the pass always runs to the end. The scrape
/// is injected so the failure path is testable without a network.
pub async fn run_pass<F, Fut>(
    conn: &mut SqliteConnection,
    queries: &[String],
    pb: &ProgressBar,
    mut scrape: F,
) -> PassSummary
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<NewVideo>, ScrapeError>>,
{
    let mut summary = PassSummary::default();
    for query in queries {
        pb.set_message(query.clone());
        match scrape(query.clone()).await {
            Ok(results) => {
                if results.is_empty() {
                    info!("No results for '{}'.", query);
                }
                match db::save_results(conn, &results, query) {
                    Ok(new) => {
                        summary.scraped += 1;
                        println!(
                            "  '{}' -> {} results, {} new saved",
                            query,
                            results.len(),
                            new
                        );
                    }
                    Err(e) => {
                        summary.failed += 1;
                        error!("Could not save results for '{}': {:#}", query, e);
                    }
                }
            }
            Err(e) => {
                summary.failed += 1;
                error!("Scrape failed for '{}': {}", query, e);
            }
        }
        pb.inc(1);
    }
    summary
}

/// The recurring tracker. Waits `interval_hours` after each pass *completes*
/// before firing the next one, so a slow pass never causes back-to-back
/// re-fires. Ctrl-C lands between ticks, never mid-query.
pub async fn start_scheduler(
    conn: &mut SqliteConnection,
    mp: &MultiProgress,
    interval_hours: u64,
) -> Result<()> {
    let interval = Duration::from_secs(interval_hours * 3600);
    println!(
        "\nScheduler started: scraping tracked queries every {} hour(s).",
        interval_hours
    );
    println!("Press Ctrl+C to stop.\n");
    info!("Scheduler starting (interval: {} hours).", interval_hours);

    loop {
        if let Err(e) = run_tracker(conn, mp).await {
            // keep the loop alive; a broken pass is a log line, not a crash
            error!("Tracker pass failed: {:#}", e);
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n  Scheduler stopped.\n");
                info!("Scheduler stopped by user.");
                return Ok(());
            }
        }
    }
}
