//! Snapshot store: keyed CRUD and range scans over snapshot rows.
//!
//! Rows are keyed by `(url, fetched_at_rev_ts)` (see [`super::keys`]), so a
//! forward scan in key order yields a url's history newest first. Scan
//! cursors are prepared statements iterated on the connection thread and
//! dropped on every exit path; results cross the async boundary as
//! materialized vectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::ArchiveDb;
use super::keys::{self, MAX_TIMESTAMP};
use crate::Error;

/// One fetch event for a canonical URL.
///
/// Immutable once stored: a newer fetch supersedes it under a different
/// `fetched_at`, it is never updated in place. Two fetches of the same url
/// in the same millisecond collide and overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Canonical (post-redirect) URL. Part of the storage key.
    pub url: String,
    /// Wall-clock epoch millis at fetch start. Part of the storage key.
    pub fetched_at: i64,
    /// Duration of the fetch in milliseconds.
    pub fetch_time_ms: i64,
    /// Size in bytes of the serialized content.
    pub size: i64,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// Outgoing links in document order, duplicates preserved.
    pub outlinks: Vec<String>,
    /// Visibility scope the content was stored under ("public" or a user id).
    /// Not part of the storage key.
    pub content_key: String,
    /// content_key -> raw HTML. In practice exactly one entry, the one
    /// just fetched.
    pub content: BTreeMap<String, String>,
}

/// Metadata projection of a snapshot: every field except the content map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub url: String,
    pub fetched_at: i64,
    pub fetch_time_ms: i64,
    pub size: i64,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub outlinks: Vec<String>,
    pub content_key: String,
}

/// Content projection of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotContent {
    pub url: String,
    pub fetched_at: i64,
    pub content: BTreeMap<String, String>,
}

impl From<SnapshotRecord> for SnapshotMeta {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            url: record.url,
            fetched_at: record.fetched_at,
            fetch_time_ms: record.fetch_time_ms,
            size: record.size,
            title: record.title,
            description: record.description,
            keywords: record.keywords,
            outlinks: record.outlinks,
            content_key: record.content_key,
        }
    }
}

impl From<SnapshotRecord> for SnapshotContent {
    fn from(record: SnapshotRecord) -> Self {
        Self { url: record.url, fetched_at: record.fetched_at, content: record.content }
    }
}

const RECORD_COLUMNS: &str = "url, fetched_at, fetch_time_ms, size, title, description,
    keywords_json, outlinks_json, content_key, content_json";

fn json_column<T: serde::de::DeserializeOwned>(row: &rusqlite::Row<'_>, idx: usize) -> Result<T, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<SnapshotRecord, rusqlite::Error> {
    Ok(SnapshotRecord {
        url: row.get(0)?,
        fetched_at: row.get(1)?,
        fetch_time_ms: row.get(2)?,
        size: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        keywords: json_column(row, 6)?,
        outlinks: json_column(row, 7)?,
        content_key: row.get(8)?,
        content: json_column(row, 9)?,
    })
}

fn check_fetched_at(fetched_at: i64) -> Result<(), Error> {
    if fetched_at < 0 {
        return Err(Error::InvalidInput(format!("negative fetch timestamp: {fetched_at}")));
    }
    Ok(())
}

impl ArchiveDb {
    /// Insert or update a snapshot row.
    ///
    /// Upsert by `(url, fetched_at_rev_ts)`: a record with an identical url
    /// and fetch timestamp is overwritten. No side effects beyond
    /// persistence.
    pub async fn put_snapshot(&self, record: &SnapshotRecord) -> Result<(), Error> {
        check_fetched_at(record.fetched_at)?;
        let rev_ts = keys::rev_ts(record.fetched_at);
        let keywords_json = serde_json::to_string(&record.keywords)
            .map_err(|e| Error::InvalidInput(format!("failed to encode keywords: {e}")))?;
        let outlinks_json = serde_json::to_string(&record.outlinks)
            .map_err(|e| Error::InvalidInput(format!("failed to encode outlinks: {e}")))?;
        let content_json = serde_json::to_string(&record.content)
            .map_err(|e| Error::InvalidInput(format!("failed to encode content: {e}")))?;
        let record = record.clone();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO snapshots (
                    url, fetched_at_rev_ts, fetched_at, fetch_time_ms, size,
                    title, description, keywords_json, outlinks_json,
                    content_key, content_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(url, fetched_at_rev_ts) DO UPDATE SET
                    fetched_at = excluded.fetched_at,
                    fetch_time_ms = excluded.fetch_time_ms,
                    size = excluded.size,
                    title = excluded.title,
                    description = excluded.description,
                    keywords_json = excluded.keywords_json,
                    outlinks_json = excluded.outlinks_json,
                    content_key = excluded.content_key,
                    content_json = excluded.content_json",
                    params![
                        &record.url,
                        rev_ts,
                        record.fetched_at,
                        record.fetch_time_ms,
                        record.size,
                        &record.title,
                        &record.description,
                        &keywords_json,
                        &outlinks_json,
                        &record.content_key,
                        &content_json,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the snapshot fetched at an exact timestamp.
    ///
    /// Returns None if no row exists for this `(url, fetched_at)` key.
    pub async fn get_snapshot(&self, url: &str, fetched_at: i64) -> Result<Option<SnapshotRecord>, Error> {
        check_fetched_at(fetched_at)?;
        let key = keys::encode(url, fetched_at);
        self.conn
            .call(move |conn| -> Result<Option<SnapshotRecord>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM snapshots WHERE url = ?1 AND fetched_at_rev_ts = ?2"
                ))?;

                let result = stmt.query_row(params![key.url, key.fetched_at_rev_ts], record_from_row);

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get the most recent snapshot of a url.
    ///
    /// Forward scan over the url's full reverse-timestamp range; keys sort
    /// newest first, so the first row is the answer.
    pub async fn get_most_recent(&self, url: &str) -> Result<Option<SnapshotRecord>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<SnapshotRecord>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM snapshots
                    WHERE url = ?1 AND fetched_at_rev_ts BETWEEN ?2 AND ?3
                    ORDER BY fetched_at_rev_ts ASC
                    LIMIT 1"
                ))?;

                let result = stmt.query_row(params![url, 0i64, MAX_TIMESTAMP], record_from_row);

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get all snapshots of a url fetched at or after `since`, newest first.
    pub async fn get_since(&self, url: &str, since: i64) -> Result<Vec<SnapshotRecord>, Error> {
        check_fetched_at(since)?;
        let url = url.to_string();
        let rev_bound = keys::rev_ts(since);
        self.conn
            .call(move |conn| -> Result<Vec<SnapshotRecord>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM snapshots
                    WHERE url = ?1 AND fetched_at_rev_ts BETWEEN ?2 AND ?3
                    ORDER BY fetched_at_rev_ts ASC"
                ))?;

                let rows = stmt.query_map(params![url, 0i64, rev_bound], record_from_row)?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await
            .map_err(Error::from)
    }

    /// Get every fetch timestamp recorded for a url, newest first.
    pub async fn get_timestamps(&self, url: &str) -> Result<Vec<i64>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<i64>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT fetched_at FROM snapshots
                    WHERE url = ?1 AND fetched_at_rev_ts BETWEEN ?2 AND ?3
                    ORDER BY fetched_at_rev_ts ASC",
                )?;

                let rows = stmt.query_map(params![url, 0i64, MAX_TIMESTAMP], |row| row.get(0))?;
                let mut timestamps = Vec::new();
                for row in rows {
                    timestamps.push(row?);
                }
                Ok(timestamps)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the snapshot at an exact timestamp. No-op if absent.
    pub async fn delete_snapshot(&self, url: &str, fetched_at: i64) -> Result<(), Error> {
        check_fetched_at(fetched_at)?;
        let key = keys::encode(url, fetched_at);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "DELETE FROM snapshots WHERE url = ?1 AND fetched_at_rev_ts = ?2",
                    params![key.url, key.fetched_at_rev_ts],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
