mod cli;
mod db;
mod display;
mod export;
mod models;
mod scheduler;
mod schema;
mod scraper;
mod views;

use anyhow::{Context, Result};
use clap::Parser;
use diesel::sqlite::SqliteConnection;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{error, LevelFilter};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs::{self, OpenOptions};
use std::process::ExitCode;

use crate::cli::{Cli, Commands, UsageError};
use crate::scraper::ScrapeError;

// Exit codes per failure class. Clap reports argument errors with its own 2.
const EXIT_STARTUP: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_FETCH: u8 = 3;
const EXIT_STORAGE: u8 = 4;
const EXIT_EXPORT: u8 = 5;

#[tokio::main]
async fn main() -> ExitCode {
    let options = Cli::parse();

    let mp = MultiProgress::new();
    if let Err(e) = init_logging(&options, &mp) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(EXIT_STARTUP);
    }

    match run(options, &mp).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Warnings and up on the terminal, everything at the configured level in
/// the log file; the bridge keeps progress bars and log lines apart.
fn init_logging(options: &Cli, mp: &MultiProgress) -> Result<()> {
    if let Some(parent) = options.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create log directory {}", parent.display()))?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&options.log_file)
        .with_context(|| format!("unable to open log file {}", options.log_file.display()))?;

    let logger = CombinedLogger::new(vec![
        TermLogger::new(
            LevelFilter::Warn,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(options.log_level, Config::default(), log_file),
    ]);

    LogWrapper::new(mp.clone(), logger)
        .try_init()
        .context("failed to initialise logger")?;
    log::set_max_level(options.log_level.max(LevelFilter::Warn));
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<UsageError>().is_some() {
        EXIT_USAGE
    } else if err.downcast_ref::<ScrapeError>().is_some() {
        EXIT_FETCH
    } else if err.downcast_ref::<diesel::result::Error>().is_some()
        || err.downcast_ref::<diesel::ConnectionError>().is_some()
    {
        EXIT_STORAGE
    } else if err.downcast_ref::<csv::Error>().is_some()
        || err.downcast_ref::<std::io::Error>().is_some()
    {
        EXIT_EXPORT
    } else {
        EXIT_STARTUP
    }
}

async fn run(options: Cli, mp: &MultiProgress) -> Result<()> {
    let db_path = options
        .db_file
        .to_str()
        .context("database path is not valid UTF-8")?;
    let mut conn = db::establish(db_path)?;

    match options.command {
        Commands::Search { query } => cmd_search(&mut conn, &query).await,
        Commands::Browse {
            query,
            keyword,
            limit,
        } => cmd_browse(&mut conn, query.as_deref(), keyword.as_deref(), limit),
        Commands::Export { query } => cmd_export(&mut conn, query.as_deref(), &options.export_dir),
        Commands::Track { query } => cmd_track(&mut conn, &query),
        Commands::Untrack { query } => cmd_untrack(&mut conn, &query),
        Commands::Tracked => cmd_tracked(&mut conn),
        Commands::RunTracker => scheduler::run_tracker(&mut conn, mp).await,
        Commands::StartScheduler => {
            scheduler::start_scheduler(&mut conn, mp, options.interval_hours).await
        }
        Commands::Trending { limit } => cmd_trending(&mut conn, limit),
        Commands::Duplicates => cmd_duplicates(&mut conn),
    }
}

async fn cmd_search(conn: &mut SqliteConnection, query: &str) -> Result<()> {
    let query = cli::require_query(query)?;
    println!("\nSearching YouTube for: '{}'...", query);

    let results = scraper::scrape_youtube(query).await?;
    if results.is_empty() {
        println!("  No results found for '{}'.", query);
        return Ok(());
    }

    display::print_results(&results);
    let new = db::save_results(conn, &results, query)?;
    println!(
        "\n{} results shown | {} new videos saved to database\n",
        results.len(),
        new
    );
    Ok(())
}

fn cmd_browse(
    conn: &mut SqliteConnection,
    query: Option<&str>,
    keyword: Option<&str>,
    limit: i64,
) -> Result<()> {
    let rows = db::browse_videos(conn, query, keyword, Some(limit))?;
    display::print_videos(&rows);
    Ok(())
}

fn cmd_export(
    conn: &mut SqliteConnection,
    query: Option<&str>,
    export_dir: &std::path::Path,
) -> Result<()> {
    let query = query.map(cli::require_query).transpose()?;
    let rows = db::browse_videos(conn, query, None, None)?;
    let path = export::export_csv(&rows, query, export_dir)?;
    println!("\nExported {} videos to: {}\n", rows.len(), path.display());
    Ok(())
}

fn cmd_track(conn: &mut SqliteConnection, query: &str) -> Result<()> {
    let query = cli::require_query(query)?;
    if db::add_tracked_query(conn, query)? {
        println!("\nNow tracking: '{}'", query);
        println!("Run 'ytrack start-scheduler' to re-scrape it on the configured interval.\n");
    } else {
        println!("\n  Already tracking: '{}'\n", query);
    }
    Ok(())
}

fn cmd_untrack(conn: &mut SqliteConnection, query: &str) -> Result<()> {
    let query = cli::require_query(query)?;
    if db::remove_tracked_query(conn, query)? {
        println!("\nRemoved '{}' from tracking.\n", query);
    } else {
        println!("\n  '{}' was not in your tracked list.\n", query);
    }
    Ok(())
}

fn cmd_tracked(conn: &mut SqliteConnection) -> Result<()> {
    let queries = db::get_tracked_queries(conn)?;
    display::print_tracked(&queries);
    Ok(())
}

fn cmd_trending(conn: &mut SqliteConnection, limit: i64) -> Result<()> {
    let rows = db::get_trending(conn, limit)?;
    display::print_trending(&rows);
    Ok(())
}

fn cmd_duplicates(conn: &mut SqliteConnection) -> Result<()> {
    let rows = db::get_duplicates(conn)?;
    display::print_duplicates(&rows);
    Ok(())
}
