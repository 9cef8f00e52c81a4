use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::region::Region;

/// A stored song
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub text: Option<String>,
    pub region: String,
    pub audio: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl Song {
    pub fn region(&self) -> Region {
        Region::parse(&self.region)
    }

    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }
}

/// Lightweight row used for result lists (no text, no audio)
#[derive(Debug, Clone, PartialEq)]
pub struct SongSummary {
    pub id: i64,
    pub title: String,
    pub region: String,
}

impl SongSummary {
    pub fn region(&self) -> Region {
        Region::parse(&self.region)
    }
}

/// Fields for a new song
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewSong {
    pub title: String,
    pub text: Option<String>,
    pub region: String,
    pub audio: Option<Vec<u8>>,
}

/// Partial update, `None` leaves the column untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SongUpdate {
    pub title: Option<String>,
    pub text: Option<String>,
    pub region: Option<String>,
    pub audio: Option<Vec<u8>>,
}

impl SongUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.region.is_none() && self.audio.is_none()
    }
}

/// Column a substring search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchField {
    Title,
    Text,
    /// Whole region string
    Region,
    /// Category search matches the whole region string
    Category,
    /// Only the part after the separator
    Place,
}

impl SearchField {
    fn column_expr(self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Text => "text",
            SearchField::Region | SearchField::Category => "region",
            SearchField::Place => "split_part(region, '|', 2)",
        }
    }
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS songs (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            text TEXT,
            region TEXT NOT NULL,
            audio BYTEA,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create songs table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert a song and return its generated id
pub async fn create_song(pool: &PgPool, song: &NewSong) -> Result<i64, StoreError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO songs (title, text, region, audio) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&song.title)
    .bind(&song.text)
    .bind(&song.region)
    .bind(&song.audio)
    .fetch_one(pool)
    .await?;

    info!(song_id = id, "Song created");
    Ok(id)
}

/// Read a song by id
pub async fn read_song(pool: &PgPool, song_id: i64) -> Result<Option<Song>, StoreError> {
    let row = sqlx::query(
        "SELECT id, title, text, region, audio, created_at FROM songs WHERE id = $1",
    )
    .bind(song_id)
    .fetch_optional(pool)
    .await?;

    let song = row.as_ref().map(song_from_row).transpose()?;
    debug!(song_id, found = song.is_some(), "Song lookup");
    Ok(song)
}

/// All songs, oldest first
pub async fn list_songs(pool: &PgPool) -> Result<Vec<SongSummary>, StoreError> {
    let rows = sqlx::query("SELECT id, title, region FROM songs ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(summary_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Case-insensitive substring search on one field
pub async fn search_songs(
    pool: &PgPool,
    field: SearchField,
    query: &str,
) -> Result<Vec<SongSummary>, StoreError> {
    let sql = format!(
        "SELECT id, title, region FROM songs WHERE {} ILIKE $1 ESCAPE '\\' ORDER BY id",
        field.column_expr()
    );

    let rows = sqlx::query(&sql)
        .bind(like_pattern(query))
        .fetch_all(pool)
        .await?;

    debug!(?field, results = rows.len(), "Song search completed");

    Ok(rows
        .iter()
        .map(summary_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Apply a partial update and return the stored song
pub async fn update_song(
    pool: &PgPool,
    song_id: i64,
    update: &SongUpdate,
) -> Result<Song, StoreError> {
    let row = sqlx::query(
        "UPDATE songs SET
            title = COALESCE($2, title),
            text = COALESCE($3, text),
            region = COALESCE($4, region),
            audio = COALESCE($5, audio)
         WHERE id = $1
         RETURNING id, title, text, region, audio, created_at",
    )
    .bind(song_id)
    .bind(&update.title)
    .bind(&update.text)
    .bind(&update.region)
    .bind(&update.audio)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            info!(song_id, "Song updated");
            Ok(song_from_row(&row)?)
        }
        None => Err(StoreError::NotFound(song_id)),
    }
}

/// Delete a song, failing when it does not exist
pub async fn delete_song(pool: &PgPool, song_id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM songs WHERE id = $1")
        .bind(song_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(song_id));
    }

    info!(song_id, "Song deleted");
    Ok(())
}

/// Number of stored songs
pub async fn count_songs(pool: &PgPool) -> Result<i64, StoreError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?)
}

/// Wrap a user query for `ILIKE`, matching `%`, `_` and `\` literally
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn song_from_row(row: &PgRow) -> Result<Song, sqlx::Error> {
    Ok(Song {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        region: row.try_get("region")?,
        audio: row.try_get("audio")?,
        created_at: row.try_get("created_at")?,
    })
}

fn summary_from_row(row: &PgRow) -> Result<SongSummary, sqlx::Error> {
    Ok(SongSummary {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        region: row.try_get("region")?,
    })
}
