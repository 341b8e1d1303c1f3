use anyhow::{anyhow, Context, Result};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};
use std::collections::HashSet;

use crate::models::{DuplicateRow, NewTrackedQuery, NewVideo, NewViewSnapshot, TrendingRow, Video};
use crate::schema::{tracked_queries, videos, view_snapshots};

pub const EMBEDDED_MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish(db_path: &str) -> Result<SqliteConnection> {
    let mut connection = SqliteConnection::establish(db_path)
        .with_context(|| format!("unable to open database {}", db_path))?;
    connection
        .run_pending_migrations(EMBEDDED_MIGRATIONS)
        .map_err(|e| anyhow!("database migration failed: {}", e))?;
    debug!("Database ready: {}", db_path);
    Ok(connection)
}

/// The persistence gate. Inserts only records whose video id is not already
/// stored under this query; existing rows are skipped, never updated. The
/// set of known ids is read once, at the moment of the batch insert.
///
/// Independently of the gate, a view snapshot is recorded for every record
/// whose count parsed and differs from the latest snapshot of that video.
/// Returns the number of newly inserted rows.
pub fn save_results(
    conn: &mut SqliteConnection,
    results: &[NewVideo],
    query: &str,
) -> Result<usize> {
    let mut known: HashSet<String> = videos::table
        .filter(videos::query.eq(query))
        .select(videos::video_id)
        .load::<String>(conn)
        .context("failed to read stored video ids")?
        .into_iter()
        .collect();

    let mut new_count = 0;
    for record in results {
        record_snapshot(conn, record)?;

        if known.contains(&record.video_id) {
            debug!("Skipping known video {} for '{}'.", record.video_id, query);
            continue;
        }
        diesel::insert_into(videos::table)
            .values(record)
            .execute(conn)
            .with_context(|| format!("failed to insert video {}", record.video_id))?;
        known.insert(record.video_id.clone());
        new_count += 1;
    }

    info!("Saved {} new result(s) for query '{}'.", new_count, query);
    Ok(new_count)
}

fn record_snapshot(conn: &mut SqliteConnection, record: &NewVideo) -> Result<()> {
    let Some(count) = record.views_int else {
        return Ok(());
    };
    let latest: Option<Option<i64>> = view_snapshots::table
        .filter(view_snapshots::video_id.eq(&record.video_id))
        .order(view_snapshots::id.desc())
        .select(view_snapshots::views_int)
        .first(conn)
        .optional()?;

    if latest.flatten() != Some(count) {
        diesel::insert_into(view_snapshots::table)
            .values(NewViewSnapshot {
                video_id: &record.video_id,
                views_int: Some(count),
                recorded_at: &record.scraped_at,
            })
            .execute(conn)?;
        debug!(
            "Snapshot recorded for {}: {:?} -> {}",
            record.video_id,
            latest.flatten(),
            count
        );
    }
    Ok(())
}

// ---- Tracked queries -------------------------------------------------------

/// Idempotent insert. Returns false when the query was already tracked.
pub fn add_tracked_query(conn: &mut SqliteConnection, query: &str) -> Result<bool> {
    let inserted = diesel::insert_into(tracked_queries::table)
        .values(NewTrackedQuery { query })
        .on_conflict_do_nothing()
        .execute(conn)?;
    if inserted > 0 {
        info!("Added tracked query: '{}'", query);
    }
    Ok(inserted > 0)
}

/// Idempotent delete. Returns false when the query was not tracked.
pub fn remove_tracked_query(conn: &mut SqliteConnection, query: &str) -> Result<bool> {
    let removed =
        diesel::delete(tracked_queries::table.filter(tracked_queries::query.eq(query)))
            .execute(conn)?;
    if removed > 0 {
        info!("Removed tracked query: '{}'", query);
    }
    Ok(removed > 0)
}

/// All tracked queries, in insertion order (the order the scheduler walks).
pub fn get_tracked_queries(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    Ok(tracked_queries::table
        .order(tracked_queries::id.asc())
        .select(tracked_queries::query)
        .load(conn)?)
}

// ---- Browse / export reads -------------------------------------------------

/// Read-only projection over stored videos. `query` filters on the exact
/// originating query, `keyword` substring-matches title or channel; both
/// may be combined. Newest scrapes first.
pub fn browse_videos(
    conn: &mut SqliteConnection,
    query: Option<&str>,
    keyword: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<Video>> {
    let mut q = videos::table.into_boxed::<Sqlite>();
    if let Some(filter) = query {
        q = q.filter(videos::query.eq(filter.to_owned()));
    }
    if let Some(kw) = keyword {
        let pattern = format!("%{}%", kw);
        q = q.filter(
            videos::title
                .like(pattern.clone())
                .or(videos::channel.like(pattern)),
        );
    }
    if let Some(n) = limit {
        q = q.limit(n);
    }
    Ok(q.order(videos::scraped_at.desc()).load(conn)?)
}

/// Videos with the highest view growth between their two most recent
/// snapshots. Window functions keep this in one round trip, so it stays
/// raw SQL rather than dsl.
pub fn get_trending(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<TrendingRow>> {
    let rows = diesel::sql_query(
        r#"
        WITH ranked AS (
            SELECT
                video_id,
                views_int,
                recorded_at,
                ROW_NUMBER() OVER (
                    PARTITION BY video_id
                    ORDER BY recorded_at DESC, id DESC
                ) AS rn
            FROM view_snapshots
        ),
        latest   AS (SELECT video_id, views_int AS latest_views FROM ranked WHERE rn = 1),
        previous AS (SELECT video_id, views_int AS prev_views   FROM ranked WHERE rn = 2)
        SELECT
            MAX(v.title)   AS title,
            MAX(v.channel) AS channel,
            MAX(v.query)   AS query,
            MAX(v.url)     AS url,
            l.latest_views AS latest_views,
            p.prev_views   AS prev_views,
            (l.latest_views - p.prev_views) AS growth,
            ROUND(
                CAST(l.latest_views - p.prev_views AS REAL)
                / NULLIF(p.prev_views, 0) * 100,
                2
            ) AS growth_pct
        FROM latest l
        JOIN previous p USING (video_id)
        JOIN videos v ON v.video_id = l.video_id
        WHERE l.latest_views > p.prev_views
        GROUP BY l.video_id
        ORDER BY growth DESC
        LIMIT ?
        "#,
    )
    .bind::<diesel::sql_types::BigInt, _>(limit)
    .load(conn)?;
    debug!("get_trending() returned {} row(s).", rows.len());
    Ok(rows)
}

/// Videos that were stored under more than one search query.
pub fn get_duplicates(conn: &mut SqliteConnection) -> Result<Vec<DuplicateRow>> {
    let rows = diesel::sql_query(
        r#"
        SELECT
            video_id,
            MAX(title)                   AS title,
            MAX(channel)                 AS channel,
            MAX(views_int)               AS views_int,
            COUNT(DISTINCT query)        AS query_count,
            GROUP_CONCAT(DISTINCT query) AS queries,
            MAX(url)                     AS url
        FROM videos
        GROUP BY video_id
        HAVING COUNT(DISTINCT query) > 1
        ORDER BY query_count DESC, views_int DESC
        "#,
    )
    .load(conn)?;
    debug!("get_duplicates() returned {} row(s).", rows.len());
    Ok(rows)
}
