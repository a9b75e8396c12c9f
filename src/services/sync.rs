//! Remote sync agent.
//!
//! A cycle fetches the remote list without holding the book lock, projects
//! it onto quote candidates, then merges under the lock with a
//! remote-always-wins policy:
//!
//! - a local quote matches a candidate by `server_id`, else by
//!   [`QuoteKey`]; each local quote matches at most one candidate
//! - a matched quote that differs from its candidate is overwritten
//! - an unmatched candidate is appended
//! - with pruning on, remote-origin quotes absent from the fetch are
//!   removed; local-only quotes are never removed
//!
//! Cycles never overlap: a trigger while a cycle is running is skipped.

use crate::config::SyncSettings;
use crate::models::{Notification, Quote, QuoteKey};
use crate::observability::NotificationBus;
use crate::remote::{PostProjection, RemoteSource};
use crate::services::book::{SharedBook, lock_book};
use crate::{Error, Result};
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::instrument;

/// Counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Candidates produced by the fetch.
    pub fetched: usize,
    /// Candidates appended as new quotes.
    pub added: usize,
    /// Local quotes overwritten by a candidate.
    pub updated: usize,
    /// Remote-origin quotes pruned.
    pub removed: usize,
}

impl SyncStats {
    /// Returns true if the merge changed nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }

    /// Returns a human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            "No updates from server".to_string()
        } else {
            format!(
                "Sync complete: {} added, {} updated, {} removed",
                self.added, self.updated, self.removed
            )
        }
    }
}

/// Result of a sync trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A cycle ran to completion.
    Completed(SyncStats),
    /// Another cycle was in flight.
    Skipped,
}

/// Merges remote candidates into `quotes` in place.
pub fn merge_remote(
    quotes: &mut Vec<Quote>,
    candidates: Vec<Quote>,
    prune_missing: bool,
) -> SyncStats {
    let mut stats = SyncStats {
        fetched: candidates.len(),
        ..SyncStats::default()
    };
    let now = Quote::timestamp_now();

    let mut fetched_ids: HashSet<String> = HashSet::new();
    let mut seen_keys: HashSet<QuoteKey> = HashSet::new();
    let mut claimed = vec![false; quotes.len()];

    for candidate in candidates {
        if let Some(server_id) = &candidate.server_id
            && !fetched_ids.insert(server_id.clone())
        {
            continue;
        }
        let key = candidate.key();
        if !seen_keys.insert(key.clone()) {
            continue;
        }

        let by_server_id = candidate.server_id.as_ref().and_then(|server_id| {
            (0..quotes.len())
                .find(|&i| !claimed[i] && quotes[i].server_id.as_ref() == Some(server_id))
        });
        let matched = by_server_id
            .or_else(|| (0..quotes.len()).find(|&i| !claimed[i] && quotes[i].key() == key));

        match matched {
            Some(index) => {
                claimed[index] = true;
                let local = &mut quotes[index];
                let server_id = candidate.server_id.or_else(|| local.server_id.clone());
                if local.text != candidate.text
                    || local.category != candidate.category
                    || local.server_id != server_id
                {
                    local.text = candidate.text;
                    local.category = candidate.category;
                    local.server_id = server_id;
                    local.last_modified = Some(now);
                    stats.updated += 1;
                }
            },
            None => {
                quotes.push(Quote {
                    last_modified: Some(now),
                    ..candidate
                });
                claimed.push(true);
                stats.added += 1;
            },
        }
    }

    if prune_missing {
        let before = quotes.len();
        quotes.retain(|q| {
            q.server_id
                .as_ref()
                .is_none_or(|server_id| fetched_ids.contains(server_id))
        });
        stats.removed = before - quotes.len();
    }

    stats
}

/// Clears the in-flight flag on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodically reconciles the quote book with a remote source.
pub struct SyncAgent<R> {
    book: SharedBook,
    remote: R,
    projection: PostProjection,
    /// Fetch timeout; `None` waits indefinitely.
    timeout: Option<Duration>,
    prune_missing: bool,
    in_flight: AtomicBool,
    notifications: NotificationBus,
}

impl<R: RemoteSource> SyncAgent<R> {
    /// Creates an agent with default settings, publishing to the book's bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the book lock is poisoned.
    pub fn new(book: SharedBook, remote: R) -> Result<Self> {
        let notifications = lock_book(&book)?.notifications().clone();
        let defaults = SyncSettings::default();
        Ok(Self {
            book,
            remote,
            projection: PostProjection::from_settings(&defaults),
            timeout: timeout_from_millis(defaults.timeout_ms),
            prune_missing: defaults.prune_missing,
            in_flight: AtomicBool::new(false),
            notifications,
        })
    }

    /// Applies projection, timeout and pruning settings.
    #[must_use]
    pub fn with_settings(mut self, settings: &SyncSettings) -> Self {
        self.projection = PostProjection::from_settings(settings);
        self.timeout = timeout_from_millis(settings.timeout_ms);
        self.prune_missing = settings.prune_missing;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets whether missing remote-origin quotes are pruned.
    #[must_use]
    pub fn with_prune_missing(mut self, prune_missing: bool) -> Self {
        self.prune_missing = prune_missing;
        self
    }

    /// Returns the remote.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns true while a cycle is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one cycle unless another is in flight.
    ///
    /// Publishes a success notification when the store changed, an info
    /// notification when it did not, and an error notification on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or times out, or the merged store
    /// cannot be persisted. The store is unchanged in either case.
    #[instrument(skip_all, fields(operation = "sync.cycle"))]
    pub async fn run_cycle(&self) -> Result<SyncOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Sync already in progress, skipping trigger");
            metrics::counter!("quote_sync_total", "status" => "skipped").increment(1);
            return Ok(SyncOutcome::Skipped);
        };

        let start = Instant::now();
        let result = self.cycle().await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("quote_sync_total", "status" => status).increment(1);
        metrics::histogram!("quote_sync_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        match &result {
            Ok(stats) if stats.is_empty() => {
                self.notifications
                    .publish(Notification::info("sync", stats.summary()));
            },
            Ok(stats) => {
                self.notifications
                    .publish(Notification::success("sync", stats.summary()));
            },
            Err(e) => {
                self.notifications
                    .publish(Notification::error("sync", format!("Sync failed: {e}")));
            },
        }

        result.map(SyncOutcome::Completed)
    }

    async fn cycle(&self) -> Result<SyncStats> {
        let fetch = self.remote.fetch_posts();
        let posts = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| Error::Remote {
                    operation: "fetch_posts".to_string(),
                    cause: format!("timed out after {}ms", limit.as_millis()),
                })??,
            None => fetch.await?,
        };

        let candidates = self.projection.project_all(&posts);
        tracing::debug!(
            posts = posts.len(),
            candidates = candidates.len(),
            "Projected remote posts"
        );

        lock_book(&self.book)?.apply_remote(candidates, self.prune_missing)
    }

    /// Runs cycles every `period` until `shutdown` resolves.
    ///
    /// The first cycle starts immediately. Ticks missed while a cycle runs
    /// are skipped rather than queued. A zero period returns at once.
    pub async fn run<F>(&self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if period.is_zero() {
            tracing::warn!("Sync period is zero, not starting the sync loop");
            return;
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(period_ms = period.as_millis(), "Sync loop started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        tracing::debug!(error = %e, "Sync cycle failed, waiting for next tick");
                    }
                },
            }
        }
        tracing::info!("Sync loop stopped");
    }

    /// Sends a newly added quote to the remote (best effort).
    ///
    /// The reply is logged and never merged back into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the post fails or times out.
    #[instrument(skip_all, fields(operation = "sync.post_quote", quote_id = %quote.id))]
    pub async fn post_quote(&self, quote: &Quote) -> Result<()> {
        let post = self.remote.post_quote(quote);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, post)
                .await
                .map_err(|_| Error::Remote {
                    operation: "post_quote".to_string(),
                    cause: format!("timed out after {}ms", limit.as_millis()),
                })
                .and_then(|reply| reply),
            None => post.await,
        };

        match result {
            Ok(reply) => {
                tracing::debug!(reply = %reply, "Remote accepted quote");
                Ok(())
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to post quote to remote");
                Err(e)
            },
        }
    }
}

const fn timeout_from_millis(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationLevel;
    use crate::remote::{RemoteId, RemotePost};
    use crate::services::QuoteBook;
    use crate::storage::{KeyValueStore, MemoryStore, QUOTES_KEY};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Script = VecDeque<std::result::Result<Vec<RemotePost>, String>>;

    #[derive(Default)]
    struct ScriptedRemote {
        responses: Mutex<Script>,
        delay: Duration,
        posted: Mutex<Vec<Quote>>,
    }

    impl ScriptedRemote {
        fn new(responses: Vec<std::result::Result<Vec<RemotePost>, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl RemoteSource for ScriptedRemote {
        async fn fetch_posts(&self) -> Result<Vec<RemotePost>> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
                .map_err(|cause| Error::Remote {
                    operation: "fetch_posts".to_string(),
                    cause,
                })
        }

        async fn post_quote(&self, quote: &Quote) -> Result<serde_json::Value> {
            self.posted.lock().unwrap().push(quote.clone());
            Ok(serde_json::json!({"id": 101, "title": quote.text}))
        }
    }

    fn post(id: u64, title: &str, body: &str) -> RemotePost {
        RemotePost {
            id: RemoteId::Number(id),
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    fn shared_book(quotes: Vec<Quote>) -> (SharedBook, Arc<MemoryStore>) {
        let durable = Arc::new(MemoryStore::new());
        durable
            .set(QUOTES_KEY, &serde_json::to_string(&quotes).unwrap())
            .unwrap();
        let book = QuoteBook::open(durable.clone(), Arc::new(MemoryStore::new())).into_shared();
        (book, durable)
    }

    fn snapshot(book: &SharedBook) -> Vec<Quote> {
        lock_book(book).unwrap().store().quotes().to_vec()
    }

    #[test]
    fn test_merge_adopts_server_id_for_same_quote() {
        let mut quotes = vec![Quote::new("Alpha", "Cats")];
        let local_id = quotes[0].id.clone();

        let stats = merge_remote(
            &mut quotes,
            vec![Quote::new("Alpha", "Cats").with_server_id("1")],
            true,
        );

        assert_eq!(stats.updated, 1);
        assert_eq!(stats.added, 0);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id, local_id);
        assert_eq!(quotes[0].server_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_merge_remote_wins_on_server_id() {
        let mut quotes = vec![Quote::new("Old text", "Cats").with_server_id("7")];
        let stats = merge_remote(
            &mut quotes,
            vec![Quote::new("New text", "Dogs").with_server_id("7")],
            true,
        );

        assert_eq!(stats.updated, 1);
        assert_eq!(quotes[0].text, "New text");
        assert_eq!(quotes[0].category, "Dogs");
    }

    #[test]
    fn test_merge_ignores_duplicate_candidates() {
        let mut quotes = Vec::new();
        let stats = merge_remote(
            &mut quotes,
            vec![
                Quote::new("Beta", "Dogs").with_server_id("1"),
                Quote::new("beta", "dogs").with_server_id("2"),
                Quote::new("Gamma", "Birds").with_server_id("1"),
            ],
            true,
        );

        assert_eq!(stats.fetched, 3);
        assert_eq!(stats.added, 1);
        assert_eq!(quotes.len(), 1);
    }

    #[test]
    fn test_merge_prunes_only_remote_origin() {
        let mut quotes = vec![
            Quote::new("Local", "Mine"),
            Quote::new("Stale", "Gone").with_server_id("9"),
        ];
        let stats = merge_remote(
            &mut quotes,
            vec![Quote::new("Fresh", "New").with_server_id("1")],
            true,
        );

        assert_eq!(stats.removed, 1);
        assert_eq!(stats.added, 1);
        let texts: Vec<_> = quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["Local", "Fresh"]);
    }

    #[test]
    fn test_merge_without_pruning_keeps_stale() {
        let mut quotes = vec![Quote::new("Stale", "Gone").with_server_id("9")];
        let stats = merge_remote(&mut quotes, Vec::new(), false);
        assert!(stats.is_empty());
        assert_eq!(quotes.len(), 1);
    }

    #[test]
    fn test_stats_summary() {
        assert_eq!(SyncStats::default().summary(), "No updates from server");
        let stats = SyncStats {
            fetched: 10,
            added: 2,
            updated: 1,
            removed: 0,
        };
        assert_eq!(stats.summary(), "Sync complete: 2 added, 1 updated, 0 removed");
    }

    #[tokio::test]
    async fn test_cycle_updates_then_reports_no_updates() {
        let (book, durable) = shared_book(vec![Quote::new("Alpha", "Cats")]);
        let remote = ScriptedRemote::new(vec![
            Ok(vec![post(1, "Alpha", "Cats")]),
            Ok(vec![post(1, "Alpha", "Cats")]),
        ]);
        let agent = SyncAgent::new(book.clone(), remote).unwrap();
        let mut rx = lock_book(&book).unwrap().notifications().subscribe();

        let first = agent.run_cycle().await.unwrap();
        assert!(matches!(first, SyncOutcome::Completed(s) if s.updated == 1 && s.added == 0));
        assert_eq!(snapshot(&book).len(), 1);
        assert!(durable.get(QUOTES_KEY).unwrap().unwrap().contains("\"serverId\":\"1\""));
        assert_eq!(rx.recv().await.unwrap().level, NotificationLevel::Success);

        let second = agent.run_cycle().await.unwrap();
        assert_eq!(
            second,
            SyncOutcome::Completed(SyncStats {
                fetched: 1,
                ..SyncStats::default()
            })
        );
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Info);
        assert_eq!(notification.message, "No updates from server");
    }

    #[tokio::test]
    async fn test_cycle_adds_into_empty_store() {
        let (book, _) = shared_book(Vec::new());
        let agent = SyncAgent::new(
            book.clone(),
            ScriptedRemote::new(vec![Ok(vec![post(5, "Beta", "Dogs")])]),
        )
        .unwrap();

        let outcome = agent.run_cycle().await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Completed(s) if s.added == 1));

        let quotes = snapshot(&book);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].text, "Beta");
        assert_eq!(quotes[0].server_id.as_deref(), Some("5"));
        assert!(!quotes[0].id.as_str().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_and_notifies() {
        let (book, _) = shared_book(vec![Quote::new("Alpha", "Cats")]);
        let before = snapshot(&book);
        let agent = SyncAgent::new(
            book.clone(),
            ScriptedRemote::new(vec![Err("connection refused".to_string())]),
        )
        .unwrap();
        let mut rx = lock_book(&book).unwrap().notifications().subscribe();

        assert!(matches!(agent.run_cycle().await, Err(Error::Remote { .. })));
        assert_eq!(snapshot(&book), before);
        assert!(!agent.is_syncing());

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let (book, _) = shared_book(vec![Quote::new("Alpha", "Cats")]);
        let before = snapshot(&book);
        let remote = ScriptedRemote::new(vec![Ok(vec![post(1, "Beta", "Dogs")])])
            .with_delay(Duration::from_millis(200));
        let agent = SyncAgent::new(book.clone(), remote)
            .unwrap()
            .with_timeout(Duration::from_millis(20));

        let err = agent.run_cycle().await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(snapshot(&book), before);
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_skipped() {
        let (book, _) = shared_book(Vec::new());
        let remote = ScriptedRemote::new(vec![Ok(vec![post(1, "Beta", "Dogs")])])
            .with_delay(Duration::from_millis(100));
        let agent = SyncAgent::new(book.clone(), remote).unwrap();

        let (first, second) = tokio::join!(agent.run_cycle(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(agent.is_syncing());
            agent.run_cycle().await
        });

        assert!(matches!(first.unwrap(), SyncOutcome::Completed(_)));
        assert_eq!(second.unwrap(), SyncOutcome::Skipped);
        assert!(!agent.is_syncing());
        assert_eq!(snapshot(&book).len(), 1);
    }

    #[tokio::test]
    async fn test_add_during_fetch_survives_merge() {
        let (book, durable) = shared_book(Vec::new());
        let remote = ScriptedRemote::new(vec![Ok(vec![post(1, "Beta", "Dogs")])])
            .with_delay(Duration::from_millis(100));
        let agent = SyncAgent::new(book.clone(), remote).unwrap();

        let (outcome, ()) = tokio::join!(agent.run_cycle(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            lock_book(&book).unwrap().add("Local", "Mine").unwrap();
        });
        assert!(matches!(outcome.unwrap(), SyncOutcome::Completed(s) if s.added == 1));

        let texts: Vec<_> = snapshot(&book).into_iter().map(|q| q.text).collect();
        assert_eq!(texts, vec!["Local", "Beta"]);

        let persisted = durable.get(QUOTES_KEY).unwrap().unwrap();
        assert!(persisted.contains("Local") && persisted.contains("Beta"));
    }

    #[tokio::test]
    async fn test_settings_disable_pruning() {
        let (book, _) = shared_book(vec![Quote::new("Stale", "Gone").with_server_id("9")]);
        let settings = SyncSettings {
            prune_missing: false,
            ..SyncSettings::default()
        };
        let agent = SyncAgent::new(book.clone(), ScriptedRemote::new(vec![Ok(Vec::new())]))
            .unwrap()
            .with_settings(&settings);

        agent.run_cycle().await.unwrap();
        assert_eq!(snapshot(&book).len(), 1);
    }

    #[tokio::test]
    async fn test_post_quote_is_not_folded_back() {
        let (book, _) = shared_book(Vec::new());
        let agent = SyncAgent::new(book.clone(), ScriptedRemote::default()).unwrap();
        let quote = lock_book(&book).unwrap().add("Alpha", "Cats").unwrap();

        agent.post_quote(&quote).await.unwrap();

        assert_eq!(agent.remote().posted.lock().unwrap().len(), 1);
        assert!(snapshot(&book)[0].server_id.is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (book, _) = shared_book(Vec::new());
        let agent = SyncAgent::new(
            book.clone(),
            ScriptedRemote::new(vec![Ok(vec![post(1, "Beta", "Dogs")])]),
        )
        .unwrap();

        agent
            .run(
                Duration::from_secs(3600),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await;

        assert_eq!(snapshot(&book).len(), 1);
        assert!(!agent.is_syncing());
    }

    #[tokio::test]
    async fn test_run_refuses_zero_period() {
        let (book, _) = shared_book(Vec::new());
        let agent = SyncAgent::new(
            book.clone(),
            ScriptedRemote::new(vec![Ok(vec![post(1, "Beta", "Dogs")])]),
        )
        .unwrap();

        agent.run(Duration::ZERO, std::future::pending::<()>()).await;

        assert!(snapshot(&book).is_empty());
    }
}
