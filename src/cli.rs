use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing user input, as opposed to a failure while doing the work.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

#[derive(Parser, Debug)]
#[command(name = "ytrack", version, about = "YouTube search scraper & tracker")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "YTRACK_DB", default_value = "ytrack.db")]
    pub db_file: PathBuf,

    /// Log file path
    #[arg(long, global = true, env = "YTRACK_LOG", default_value = "ytrack.log")]
    pub log_file: PathBuf,

    /// File log verbosity (the console only shows warnings and up)
    #[arg(long, global = true, env = "YTRACK_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Directory CSV exports are written to
    #[arg(long, global = true, env = "YTRACK_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Hours between scheduler passes
    #[arg(long, global = true, env = "YTRACK_INTERVAL_HOURS", default_value_t = 24)]
    pub interval_hours: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search YouTube and save the results
    Search { query: String },

    /// Browse saved videos
    Browse {
        /// Only rows whose originating query matches exactly
        #[arg(long)]
        query: Option<String>,
        /// Substring match against title or channel
        #[arg(long)]
        keyword: Option<String>,
        /// Max rows shown
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },

    /// Export saved videos to a timestamped CSV
    Export {
        /// Optional: only rows for this query
        query: Option<String>,
    },

    /// Add a query to the tracked set
    Track { query: String },

    /// Remove a query from the tracked set
    Untrack { query: String },

    /// List tracked queries
    Tracked,

    /// Scrape every tracked query once, now
    RunTracker,

    /// Re-scrape tracked queries on the configured interval until interrupted
    StartScheduler,

    /// Show the fastest-growing videos between their two most recent snapshots
    Trending {
        /// Max results
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Show videos that appear under more than one query
    Duplicates,
}

/// Reject blank queries before any work happens.
pub fn require_query(query: &str) -> Result<&str, UsageError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(UsageError("query must not be empty".to_string()));
    }
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn blank_queries_are_rejected() {
        assert!(require_query("").is_err());
        assert!(require_query("   ").is_err());
        assert_eq!(require_query(" rust ").unwrap(), "rust");
    }

    #[test]
    fn defaults_are_documented_values() {
        let cli = Cli::try_parse_from(["ytrack", "tracked"]).unwrap();
        assert_eq!(cli.db_file, PathBuf::from("ytrack.db"));
        assert_eq!(cli.log_file, PathBuf::from("ytrack.log"));
        assert_eq!(cli.log_level, LevelFilter::Info);
        assert_eq!(cli.export_dir, PathBuf::from("."));
        assert_eq!(cli.interval_hours, 24);
    }
}
