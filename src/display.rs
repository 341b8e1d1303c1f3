use crate::models::{DuplicateRow, NewVideo, TrendingRow, Video};

/// Char-safe truncation with an ellipsis, so wide titles keep columns lined up.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

fn cell(s: &str, max: usize) -> String {
    let s = truncate(s, max);
    format!("{:<width$}", s, width = max)
}

/// Fresh search results, numbered.
pub fn print_results(results: &[NewVideo]) {
    if results.is_empty() {
        println!("  No results to display.");
        return;
    }
    println!();
    println!(
        "  {:>3}  {}  {}  {}  {}",
        "#",
        cell("Title", 55),
        cell("Channel", 20),
        cell("Duration", 8),
        "Views"
    );
    for (i, r) in results.iter().enumerate() {
        println!(
            "  {:>3}  {}  {}  {}  {}",
            i + 1,
            cell(&r.title, 55),
            cell(&r.channel, 20),
            cell(&r.duration, 8),
            r.views
        );
    }
}

/// Stored rows, newest first.
pub fn print_videos(rows: &[Video]) {
    if rows.is_empty() {
        println!("  No saved videos match.");
        return;
    }
    println!();
    println!(
        "  {}  {}  {}  {}  {}  {}",
        cell("Title", 45),
        cell("Channel", 18),
        cell("Duration", 8),
        cell("Views", 12),
        cell("Query", 18),
        "Scraped At"
    );
    for r in rows {
        println!(
            "  {}  {}  {}  {}  {}  {}",
            cell(&r.title, 45),
            cell(&r.channel, 18),
            cell(&r.duration, 8),
            cell(&r.views, 12),
            cell(&r.query, 18),
            r.scraped_at
        );
    }
    println!("\n  {} row(s)", rows.len());
}

pub fn print_trending(rows: &[TrendingRow]) {
    if rows.is_empty() {
        println!("  No growth data yet. Videos trend once they have two view snapshots.");
        return;
    }
    println!();
    println!(
        "  {}  {}  {:>12}  {:>12}  {:>10}  {:>8}",
        cell("Title", 45),
        cell("Channel", 18),
        "Previous",
        "Latest",
        "Growth",
        "%"
    );
    for r in rows {
        println!(
            "  {}  {}  {:>12}  {:>12}  {:>10}  {:>8}",
            cell(&r.title, 45),
            cell(&r.channel, 18),
            r.prev_views,
            r.latest_views,
            r.growth,
            r.growth_pct
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

pub fn print_duplicates(rows: &[DuplicateRow]) {
    if rows.is_empty() {
        println!("  No videos appear under more than one query.");
        return;
    }
    println!();
    println!(
        "  {}  {}  {:>8}  {}",
        cell("Title", 45),
        cell("Channel", 18),
        "Queries",
        "Seen under"
    );
    for r in rows {
        println!(
            "  {}  {}  {:>8}  {}",
            cell(&r.title, 45),
            cell(&r.channel, 18),
            r.query_count,
            r.queries
        );
    }
}

pub fn print_tracked(queries: &[String]) {
    if queries.is_empty() {
        println!("\n  No tracked queries yet. Use: ytrack track \"your query\"\n");
        return;
    }
    println!("\nTracked queries:");
    for (i, q) in queries.iter().enumerate() {
        println!("  {}. {}", i + 1, q);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn truncate_is_char_safe() {
        // multi-byte chars must not be split
        assert_eq!(truncate("ありがとうございました", 8), "ありがとう...");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }
}
