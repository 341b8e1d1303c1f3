use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Nullable, Text};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::videos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Video {
    pub id: i32,
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub views: String,
    pub views_int: Option<i64>,
    pub url: String,
    pub query: String,
    pub scraped_at: String,
}

/// One scraped observation, ready for the persistence gate.
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::videos)]
pub struct NewVideo {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub views: String,
    pub views_int: Option<i64>,
    pub url: String,
    pub query: String,
    pub scraped_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::tracked_queries)]
pub struct NewTrackedQuery<'a> {
    pub query: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::view_snapshots)]
pub struct NewViewSnapshot<'a> {
    pub video_id: &'a str,
    pub views_int: Option<i64>,
    pub recorded_at: &'a str,
}

/// Row of the windowed trending query (raw SQL, see `db::get_trending`).
#[derive(QueryableByName, Debug)]
pub struct TrendingRow {
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub channel: String,
    #[diesel(sql_type = Text)]
    pub query: String,
    #[diesel(sql_type = Text)]
    pub url: String,
    #[diesel(sql_type = BigInt)]
    pub latest_views: i64,
    #[diesel(sql_type = BigInt)]
    pub prev_views: i64,
    #[diesel(sql_type = BigInt)]
    pub growth: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub growth_pct: Option<f64>,
}

/// A video stored under more than one query (see `db::get_duplicates`).
#[derive(QueryableByName, Debug)]
pub struct DuplicateRow {
    #[diesel(sql_type = Text)]
    pub video_id: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub channel: String,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub views_int: Option<i64>,
    #[diesel(sql_type = BigInt)]
    pub query_count: i64,
    #[diesel(sql_type = Text)]
    pub queries: String,
    #[diesel(sql_type = Text)]
    pub url: String,
}
