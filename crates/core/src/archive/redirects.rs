//! Redirect table and the resolution overlay.
//!
//! Snapshots of a redirecting URL are filed under its final destination, so
//! every read path first maps the requested url through this table. The
//! mapping is single-hop and updated eagerly after every fetch; chains are
//! never followed here because the fetch step already followed the full
//! HTTP redirect chain before reconciliation runs.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::ArchiveDb;
use crate::Error;

/// Mapping from a requested URL to the canonical URL its history is
/// stored under. At most one destination per source url.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRecord {
    pub url: String,
    pub destination_url: String,
}

impl ArchiveDb {
    /// Get the redirect row for a url, if one exists.
    pub async fn get_redirect(&self, url: &str) -> Result<Option<RedirectRecord>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<RedirectRecord>, Error> {
                let mut stmt = conn.prepare("SELECT url, destination_url FROM redirects WHERE url = ?1")?;

                let result = stmt.query_row(params![url], |row| {
                    Ok(RedirectRecord { url: row.get(0)?, destination_url: row.get(1)? })
                });

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the redirect row for `record.url`.
    pub async fn put_redirect(&self, record: &RedirectRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO redirects (url, destination_url) VALUES (?1, ?2)
                    ON CONFLICT(url) DO UPDATE SET destination_url = excluded.destination_url",
                    params![&record.url, &record.destination_url],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the redirect row for a url. No-op if absent.
    pub async fn delete_redirect(&self, url: &str) -> Result<(), Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM redirects WHERE url = ?1", params![url])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Resolve a requested url to the url its snapshots are stored under.
    ///
    /// Returns the redirect destination when a mapping exists, otherwise the
    /// requested url unchanged. The single indirection point for every read
    /// path.
    pub async fn resolve_url(&self, url: &str) -> Result<String, Error> {
        match self.get_redirect(url).await? {
            Some(redirect) => Ok(redirect.destination_url),
            None => Ok(url.to_string()),
        }
    }

    /// Reconcile the redirect table after a fetch.
    ///
    /// A fetch that lands on a different canonical url records the mapping;
    /// a fetch that resolves to itself clears any stale mapping, so the
    /// table self-heals when a url stops redirecting.
    pub async fn reconcile_redirect(&self, requested_url: &str, canonical_url: &str) -> Result<(), Error> {
        if requested_url != canonical_url {
            tracing::debug!("recording redirect {} -> {}", requested_url, canonical_url);
            self.put_redirect(&RedirectRecord {
                url: requested_url.to_string(),
                destination_url: canonical_url.to_string(),
            })
            .await
        } else {
            self.delete_redirect(requested_url).await
        }
    }
}
