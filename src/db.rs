use std::time::Duration;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use time::OffsetDateTime;

/// Opens the pool and brings the schema up to date.
///
/// In-memory databases live per connection, so they get exactly one.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 16 })
        // closing the only in-memory connection drops the database
        .idle_timeout((!in_memory).then(|| Duration::from_secs(600)))
        .max_lifetime((!in_memory).then(|| Duration::from_secs(1800)))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;
    Ok(db_pool)
}

/// Unix seconds, the timestamp format of every table.
pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub fn format_timestamp(unix: i64) -> String {
    OffsetDateTime::from_unix_timestamp(unix)
        .map(|t| {
            format!(
                "{}-{:02}-{:02} {:02}:{:02}",
                t.year(),
                u8::from(t.month()),
                t.day(),
                t.hour(),
                t.minute()
            )
        })
        .unwrap_or_default()
}
