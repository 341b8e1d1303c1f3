use chrono::Local;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::NewVideo;
use crate::views::parse_view_count;

static INITIAL_DATA_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch search page: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("could not find ytInitialData in the page")]
    MissingInitialData,
    #[error("ytInitialData is not valid JSON: {0}")]
    BadInitialData(#[from] serde_json::Error),
    #[error("unexpected search response shape")]
    UnexpectedShape,
    #[error("found {0} result item(s) but extracted none of them (site format changed?)")]
    ExtractionDrift(usize),
}

/// Fetch the search results page for `query` and extract all video records.
pub async fn scrape_youtube(query: &str) -> Result<Vec<NewVideo>, ScrapeError> {
    let url = format!(
        "https://www.youtube.com/results?search_query={}",
        query.replace(' ', "+")
    );
    info!("Fetching: {}", url);

    let html = reqwest::get(&url).await?.error_for_status()?.text().await?;
    debug!("Read {} bytes from {}", html.len(), url);

    let records = extract_results(&html, query)?;
    info!("Scraped {} video(s) for query '{}'.", records.len(), query);
    Ok(records)
}

/// Pull the `ytInitialData` blob out of the page and map every
/// `videoRenderer` item to a `NewVideo`. All records of one batch share a
/// single capture timestamp.
pub fn extract_results(html: &str, query: &str) -> Result<Vec<NewVideo>, ScrapeError> {
    let re = INITIAL_DATA_RE
        .get_or_init(|| Regex::new(r"(?s)var ytInitialData = (\{.*?\});").unwrap());

    let blob = re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(ScrapeError::MissingInitialData)?;

    let data: Value = serde_json::from_str(blob.as_str())?;

    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .ok_or(ScrapeError::UnexpectedShape)?;

    let renderers: Vec<&Value> = sections
        .iter()
        .filter_map(|s| s.pointer("/itemSectionRenderer/contents"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .collect();

    let scraped_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let results: Vec<NewVideo> = renderers
        .iter()
        .filter_map(|v| parse_item(v, query, &scraped_at))
        .collect();

    // A page full of result items none of which we can read means the site
    // format drifted, which is not the same thing as a query with no hits.
    if results.is_empty() && !renderers.is_empty() {
        return Err(ScrapeError::ExtractionDrift(renderers.len()));
    }
    Ok(results)
}

/// Per-field tolerant mapping of one `videoRenderer`. Only the video id is
/// mandatory (nothing can be stored or deduplicated without it); every
/// other missing field becomes an empty string.
fn parse_item(v: &Value, query: &str, scraped_at: &str) -> Option<NewVideo> {
    let video_id = match v.get("videoId").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            warn!("Skipping result item without a videoId.");
            return None;
        }
    };

    let views = field(v, "/viewCountText/simpleText");
    Some(NewVideo {
        url: format!("https://youtube.com/watch?v={}", video_id),
        video_id,
        title: field(v, "/title/runs/0/text"),
        channel: field(v, "/ownerText/runs/0/text"),
        duration: field(v, "/lengthText/simpleText"),
        views_int: parse_view_count(&views),
        views,
        query: query.to_string(),
        scraped_at: scraped_at.to_string(),
    })
}

fn field(v: &Value, pointer: &str) -> String {
    v.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(items: &str) -> String {
        format!(
            concat!(
                "<html><script>var ytInitialData = {{",
                "\"contents\":{{\"twoColumnSearchResultsRenderer\":{{\"primaryContents\":",
                "{{\"sectionListRenderer\":{{\"contents\":[{{\"itemSectionRenderer\":",
                "{{\"contents\":[{}]}}}}]}}}}}}}}}};</script></html>"
            ),
            items
        )
    }

    const FULL_ITEM: &str = r#"{"videoRenderer":{
        "videoId":"abc123DEF45",
        "title":{"runs":[{"text":"Rust in 100 Seconds"}]},
        "ownerText":{"runs":[{"text":"Fireship"}]},
        "lengthText":{"simpleText":"2:24"},
        "viewCountText":{"simpleText":"1.2M views"}}}"#;

    // lengthText and viewCountText gone, title runs empty
    const SPARSE_ITEM: &str = r#"{"videoRenderer":{
        "videoId":"xyz987",
        "title":{"runs":[]},
        "ownerText":{"runs":[{"text":"someone"}]}}}"#;

    const NO_ID_ITEM: &str = r#"{"videoRenderer":{
        "title":{"runs":[{"text":"who am I"}]}}}"#;

    #[test]
    fn extracts_full_item() {
        let html = page_with(FULL_ITEM);
        let results = extract_results(&html, "rust").unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.video_id, "abc123DEF45");
        assert_eq!(r.title, "Rust in 100 Seconds");
        assert_eq!(r.channel, "Fireship");
        assert_eq!(r.duration, "2:24");
        assert_eq!(r.views, "1.2M views");
        assert_eq!(r.views_int, Some(1_200_000));
        assert_eq!(r.url, "https://youtube.com/watch?v=abc123DEF45");
        assert_eq!(r.query, "rust");
        assert!(!r.scraped_at.is_empty());
    }

    #[test]
    fn missing_fields_become_empty_not_errors() {
        let html = page_with(&format!("{},{}", FULL_ITEM, SPARSE_ITEM));
        let results = extract_results(&html, "rust").unwrap();
        assert_eq!(results.len(), 2);
        let sparse = &results[1];
        assert_eq!(sparse.video_id, "xyz987");
        assert_eq!(sparse.title, "");
        assert_eq!(sparse.duration, "");
        assert_eq!(sparse.views, "");
        assert_eq!(sparse.views_int, None);
    }

    #[test]
    fn item_without_id_is_skipped() {
        let html = page_with(&format!("{},{}", NO_ID_ITEM, FULL_ITEM));
        let results = extract_results(&html, "rust").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].video_id, "abc123DEF45");
    }

    #[test]
    fn zero_results_is_not_an_error() {
        let html = page_with("");
        let results = extract_results(&html, "rust").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn all_items_unreadable_is_drift() {
        let html = page_with(&format!("{},{}", NO_ID_ITEM, NO_ID_ITEM));
        match extract_results(&html, "rust") {
            Err(ScrapeError::ExtractionDrift(n)) => assert_eq!(n, 2),
            other => panic!("expected drift, got {:?}", other),
        }
    }

    #[test]
    fn page_without_initial_data() {
        let err = extract_results("<html>nope</html>", "rust").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingInitialData));
    }

    #[test]
    fn unexpected_json_shape() {
        let html = r#"var ytInitialData = {"contents":{}};"#;
        let err = extract_results(html, "rust").unwrap_err();
        assert!(matches!(err, ScrapeError::UnexpectedShape));
    }
}
