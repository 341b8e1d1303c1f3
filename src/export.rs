use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::Video;

/// CSV column order follows the stored record's attribute order.
pub const CSV_HEADER: [&str; 9] = [
    "video_id",
    "title",
    "channel",
    "duration",
    "views",
    "views_int",
    "url",
    "query",
    "scraped_at",
];

// Export shape of one stored row; field order is the column order.
#[derive(Serialize)]
struct ExportRow<'a> {
    video_id: &'a str,
    title: &'a str,
    channel: &'a str,
    duration: &'a str,
    views: &'a str,
    views_int: Option<i64>,
    url: &'a str,
    query: &'a str,
    scraped_at: &'a str,
}

impl<'a> From<&'a Video> for ExportRow<'a> {
    fn from(v: &'a Video) -> Self {
        ExportRow {
            video_id: &v.video_id,
            title: &v.title,
            channel: &v.channel,
            duration: &v.duration,
            views: &v.views,
            views_int: v.views_int,
            url: &v.url,
            query: &v.query,
            scraped_at: &v.scraped_at,
        }
    }
}

/// Write `rows` to a timestamped CSV under `export_dir` and return its path.
/// A header-only file is still written when there are no rows, so an export
/// always leaves evidence of having run.
pub fn export_csv(rows: &[Video], query: Option<&str>, export_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = match query {
        Some(q) => format!("youtube_{}_{}.csv", q.replace(' ', "_"), timestamp),
        None => format!("youtube_all_{}.csv", timestamp),
    };
    let path = export_dir.join(filename);

    // Header is written explicitly so a zero-row export is not an empty file.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("unable to create {}", path.display()))?;
    writer.write_record(CSV_HEADER)?;
    for v in rows {
        writer.serialize(ExportRow::from(v))?;
    }
    writer.flush()?;

    info!("Exported {} row(s) to {}.", rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(video_id: &str, query: &str) -> Video {
        Video {
            id: 1,
            video_id: video_id.to_string(),
            title: "a title, with a comma".to_string(),
            channel: "channel".to_string(),
            duration: "1:23".to_string(),
            views: "1.2M views".to_string(),
            views_int: Some(1_200_000),
            url: format!("https://youtube.com/watch?v={}", video_id),
            query: query.to_string(),
            scraped_at: "2025-08-24 10:00:00".to_string(),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_csv(&[video("a", "rust")], Some("rust"), dir.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "video_id,title,channel,duration,views,views_int,url,query,scraped_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("a,\"a title, with a comma\",channel,1:23,"));
        assert!(row.contains("1200000"));
        assert!(lines.next().is_none());

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("youtube_rust_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn zero_rows_still_produce_a_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_csv(&[], None, dir.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("youtube_all_"));
    }

    #[test]
    fn query_with_spaces_is_underscored_in_the_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_csv(&[], Some("rust async"), dir.path()).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("youtube_rust_async_"));
    }
}
