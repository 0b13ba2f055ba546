//! Snapshot service: the resolve -> store pipeline over fetch results.
//!
//! A write files the snapshot under the canonical URL the fetch landed on
//! and keeps the redirect table current; a read resolves the requested URL
//! through the redirect table before touching the store. No retries and no
//! state beyond the two handles.

use std::collections::BTreeMap;

use pagevault_client::{FetchClient, FetchedPage};
use pagevault_core::{ArchiveDb, Error, SnapshotContent, SnapshotMeta, SnapshotRecord};

/// Content scope for snapshots anyone may read.
pub const PUBLIC_CONTENT_KEY: &str = "public";

/// Scope label content is stored under: the shared public scope, or the
/// identity of the user taking the snapshot.
pub fn content_key_for<'a>(is_public: bool, user: &'a str) -> &'a str {
    if is_public { PUBLIC_CONTENT_KEY } else { user }
}

/// Orchestrates fetches and archive access.
///
/// Stateless apart from its two handles, so one instance is safe to share
/// across all concurrent requests. Concurrent snapshots of the same URL
/// race last-writer-wins, on the snapshot row and on the redirect row
/// alike; there is no cross-record transaction.
pub struct SnapshotService {
    db: ArchiveDb,
    fetcher: FetchClient,
}

impl SnapshotService {
    pub fn new(db: ArchiveDb, fetcher: FetchClient) -> Self {
        Self { db, fetcher }
    }

    /// Take a snapshot of a URL and return its metadata.
    ///
    /// The snapshot is stored under the final URL the fetch landed on; when
    /// that differs from the requested URL a redirect row is recorded so
    /// later reads of the requested URL find the stored history.
    pub async fn take_snapshot(&self, url: &str, is_public: bool, user: &str) -> Result<SnapshotMeta, Error> {
        let page = self.fetcher.fetch_page(url).await?;
        self.ingest(url, &page, content_key_for(is_public, user)).await
    }

    /// Store an already-fetched page as a snapshot.
    ///
    /// Reconciles the redirect table against the fetch outcome, then upserts
    /// the snapshot row under the canonical URL.
    pub async fn ingest(
        &self, requested_url: &str, page: &FetchedPage, content_key: &str,
    ) -> Result<SnapshotMeta, Error> {
        self.db.reconcile_redirect(requested_url, &page.canonical_url).await?;

        let record = SnapshotRecord {
            url: page.canonical_url.clone(),
            fetched_at: page.fetch_started_at_ms,
            fetch_time_ms: page.fetch_duration_ms,
            size: page.html.len() as i64,
            title: page.title.clone(),
            description: page.description.clone(),
            keywords: page.keywords.clone(),
            outlinks: page.outlinks.clone(),
            content_key: content_key.to_string(),
            content: BTreeMap::from([(content_key.to_string(), page.html.clone())]),
        };
        self.db.put_snapshot(&record).await?;

        tracing::debug!("archived snapshot of {} at {}", record.url, record.fetched_at);

        Ok(SnapshotMeta::from(record))
    }

    /// Most recent snapshot metadata for a url, if any.
    ///
    /// `user` is the identity the read runs as. Reads are scoped by the
    /// caller identity at the boundary, not by the storage key, so it is
    /// carried for attribution rather than filtering.
    pub async fn meta(&self, url: &str, user: &str) -> Result<Option<SnapshotMeta>, Error> {
        let resolved = self.resolve(url, user).await?;
        Ok(self.db.get_most_recent(&resolved).await?.map(SnapshotMeta::from))
    }

    /// Metadata of the snapshot fetched at an exact timestamp.
    pub async fn meta_at(&self, url: &str, fetched_at: i64, user: &str) -> Result<Option<SnapshotMeta>, Error> {
        let resolved = self.resolve(url, user).await?;
        Ok(self.db.get_snapshot(&resolved, fetched_at).await?.map(SnapshotMeta::from))
    }

    /// Metadata of every snapshot fetched at or after `since`, newest first.
    pub async fn meta_since(&self, url: &str, since: i64, user: &str) -> Result<Vec<SnapshotMeta>, Error> {
        let resolved = self.resolve(url, user).await?;
        let records = self.db.get_since(&resolved, since).await?;
        Ok(records.into_iter().map(SnapshotMeta::from).collect())
    }

    /// Most recent snapshot content for a url, if any.
    pub async fn content(&self, url: &str, user: &str) -> Result<Option<SnapshotContent>, Error> {
        let resolved = self.resolve(url, user).await?;
        Ok(self.db.get_most_recent(&resolved).await?.map(SnapshotContent::from))
    }

    /// Content of the snapshot fetched at an exact timestamp.
    pub async fn content_at(&self, url: &str, fetched_at: i64, user: &str) -> Result<Option<SnapshotContent>, Error> {
        let resolved = self.resolve(url, user).await?;
        Ok(self.db.get_snapshot(&resolved, fetched_at).await?.map(SnapshotContent::from))
    }

    /// Content of every snapshot fetched at or after `since`, newest first.
    pub async fn content_since(&self, url: &str, since: i64, user: &str) -> Result<Vec<SnapshotContent>, Error> {
        let resolved = self.resolve(url, user).await?;
        let records = self.db.get_since(&resolved, since).await?;
        Ok(records.into_iter().map(SnapshotContent::from).collect())
    }

    /// Every archived fetch timestamp for a url, newest first.
    pub async fn timestamps(&self, url: &str, user: &str) -> Result<Vec<i64>, Error> {
        let resolved = self.resolve(url, user).await?;
        self.db.get_timestamps(&resolved).await
    }

    async fn resolve(&self, url: &str, user: &str) -> Result<String, Error> {
        let resolved = self.db.resolve_url(url).await?;
        tracing::debug!("reading {} as {}: resolved to {}", url, user, resolved);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagevault_client::FetchConfig;

    async fn make_service() -> SnapshotService {
        let db = ArchiveDb::open_in_memory().await.unwrap();
        let fetcher = FetchClient::new(FetchConfig::default()).unwrap();
        SnapshotService::new(db, fetcher)
    }

    fn make_page(canonical_url: &str, fetched_at: i64) -> FetchedPage {
        FetchedPage {
            canonical_url: canonical_url.to_string(),
            html: "<html><body>hi</body></html>".to_string(),
            title: "Hi".to_string(),
            description: "A greeting".to_string(),
            keywords: vec!["greeting".to_string()],
            outlinks: vec!["/a".to_string()],
            fetch_started_at_ms: fetched_at,
            fetch_duration_ms: 12,
        }
    }

    #[test]
    fn test_content_key_selection() {
        assert_eq!(content_key_for(true, "alice"), "public");
        assert_eq!(content_key_for(false, "alice"), "alice");
    }

    #[tokio::test]
    async fn test_ingest_returns_meta_without_content() {
        let service = make_service().await;
        let page = make_page("https://a.com/", 100);

        let meta = service.ingest("https://a.com/", &page, "public").await.unwrap();
        assert_eq!(meta.url, "https://a.com/");
        assert_eq!(meta.fetched_at, 100);
        assert_eq!(meta.size, page.html.len() as i64);
        assert_eq!(meta.content_key, "public");
    }

    #[tokio::test]
    async fn test_redirect_transparency() {
        let service = make_service().await;
        let page = make_page("https://b.com/", 100);

        // Requested a.com, fetch landed on b.com: snapshot files under b.com
        // and reads of a.com resolve there.
        service.ingest("https://a.com/", &page, "public").await.unwrap();

        let meta = service.meta("https://a.com/", "alice").await.unwrap().unwrap();
        assert_eq!(meta.url, "https://b.com/");

        let direct = service.meta("https://b.com/", "alice").await.unwrap().unwrap();
        assert_eq!(direct.url, "https://b.com/");
    }

    #[tokio::test]
    async fn test_redirect_self_heal() {
        let service = make_service().await;
        service.ingest("https://a.com/", &make_page("https://b.com/", 100), "public").await.unwrap();

        // a.com stops redirecting: the stale mapping is dropped and reads of
        // a.com see its own history again.
        service.ingest("https://a.com/", &make_page("https://a.com/", 200), "public").await.unwrap();

        let meta = service.meta("https://a.com/", "alice").await.unwrap().unwrap();
        assert_eq!(meta.url, "https://a.com/");
        assert_eq!(meta.fetched_at, 200);
    }

    #[tokio::test]
    async fn test_meta_at_exact_timestamp() {
        let service = make_service().await;
        for ts in [100, 200, 300] {
            service.ingest("https://a.com/", &make_page("https://a.com/", ts), "public").await.unwrap();
        }

        let meta = service.meta_at("https://a.com/", 200, "alice").await.unwrap().unwrap();
        assert_eq!(meta.fetched_at, 200);

        assert!(service.meta_at("https://a.com/", 250, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_reads_are_none() {
        let service = make_service().await;
        assert!(service.meta("https://nowhere.com/", "alice").await.unwrap().is_none());
        assert!(service.content("https://nowhere.com/", "alice").await.unwrap().is_none());
        assert!(service.timestamps("https://nowhere.com/", "alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_follow_redirects() {
        let service = make_service().await;
        for ts in [100, 300, 200] {
            service.ingest("https://a.com/", &make_page("https://b.com/", ts), "public").await.unwrap();
        }

        let timestamps = service.timestamps("https://a.com/", "alice").await.unwrap();
        assert_eq!(timestamps, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn test_meta_since_newest_first() {
        let service = make_service().await;
        for ts in [100, 200, 300] {
            service.ingest("https://a.com/", &make_page("https://a.com/", ts), "public").await.unwrap();
        }

        let metas = service.meta_since("https://a.com/", 150, "alice").await.unwrap();
        let timestamps: Vec<i64> = metas.iter().map(|m| m.fetched_at).collect();
        assert_eq!(timestamps, vec![300, 200]);
    }

    #[tokio::test]
    async fn test_content_projection_carries_html() {
        let service = make_service().await;
        let page = make_page("https://a.com/", 100);
        service.ingest("https://a.com/", &page, "alice").await.unwrap();

        let content = service.content("https://a.com/", "alice").await.unwrap().unwrap();
        assert_eq!(content.content.get("alice").unwrap(), &page.html);
        assert!(content.content.get("public").is_none());
    }
}
