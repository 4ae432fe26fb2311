//! Single-flight sync entry point.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{JoinHandle, JoinSet};

use crate::auth::{CredentialStore, Credentials, TokenRefresher};
use crate::models::ItemGraph;

use super::{
    BookmarkSink, BookmarkSource, ListingFetcher, OrderAssigner, PagedItem, Paginator,
    ReferenceRanks, StopReason, SyncCursor, SyncPolicy, ThreadBackfiller,
};

/// Result of one `sync()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another run of this coordinator was still in flight
    AlreadyRunning,
    /// No refresh token or account id; nothing was fetched
    Unauthenticated,
    Completed(SyncReport),
}

/// Counters describing a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub pages_fetched: usize,
    pub items_fetched: usize,
    /// Fetched items that lie before the known boundary
    pub new_items: usize,
    /// Item rows actually inserted, referenced rows included
    pub items_persisted: usize,
    pub persist_failures: usize,
    pub backfills_started: usize,
    pub backfills_failed: usize,
    pub thread_items_persisted: usize,
    pub stop_reason: StopReason,
    pub refresh_attempted: bool,
    pub refreshed: bool,
}

impl SyncReport {
    const fn empty(stop_reason: StopReason) -> Self {
        Self {
            pages_fetched: 0,
            items_fetched: 0,
            new_items: 0,
            items_persisted: 0,
            persist_failures: 0,
            backfills_started: 0,
            backfills_failed: 0,
            thread_items_persisted: 0,
            stop_reason,
            refresh_attempted: false,
            refreshed: false,
        }
    }

    fn absorb(&mut self, outcome: ItemOutcome) {
        match outcome.persisted {
            Some(inserted) => self.items_persisted += inserted,
            None => self.persist_failures += 1,
        }
        match outcome.backfill {
            BackfillOutcome::Skipped => {}
            BackfillOutcome::Failed => {
                self.backfills_started += 1;
                self.backfills_failed += 1;
            }
            BackfillOutcome::Persisted(count) => {
                self.backfills_started += 1;
                self.thread_items_persisted += count;
            }
        }
    }
}

enum BackfillOutcome {
    Skipped,
    Failed,
    Persisted(usize),
}

struct ItemOutcome {
    persisted: Option<usize>,
    backfill: BackfillOutcome,
}

/// Releases the in-flight flag when dropped, whatever happened to the run
struct InFlightGuard<'a> {
    flag: &'a Mutex<bool>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a Mutex<bool>) -> Option<Self> {
        let mut in_flight = flag.lock().unwrap_or_else(PoisonError::into_inner);
        if *in_flight {
            return None;
        }
        *in_flight = true;
        Some(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.flag.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Sync pipeline for one platform
///
/// Construct once per platform and share it (usually behind an `Arc`); the
/// in-flight flag lives on the instance, so two coordinators for the same
/// platform would not exclude each other.
pub struct SyncCoordinator<S, L, R> {
    source: Arc<S>,
    sink: Arc<L>,
    credentials: Arc<CredentialStore<R>>,
    policy: SyncPolicy,
    in_flight: Mutex<bool>,
}

impl<S, L, R> SyncCoordinator<S, L, R>
where
    S: BookmarkSource,
    L: BookmarkSink,
    R: TokenRefresher,
{
    pub fn new(
        source: Arc<S>,
        sink: Arc<L>,
        credentials: Arc<CredentialStore<R>>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            source,
            sink,
            credentials,
            policy,
            in_flight: Mutex::new(false),
        }
    }

    pub const fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    pub fn credentials(&self) -> &CredentialStore<R> {
        &self.credentials
    }

    /// Whether a run is currently in flight
    pub fn is_running(&self) -> bool {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the pipeline on the tokio runtime without waiting for it
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<SyncOutcome> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.sync().await })
    }

    /// Run the pipeline to completion.
    ///
    /// Returns immediately when a run is already in flight or the
    /// credentials are incomplete. Failures end the run early but are only
    /// logged; whatever was stored before them stays stored.
    pub async fn sync(&self) -> SyncOutcome {
        let platform = self.source.platform();
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!(%platform, "Sync already in flight, skipping");
            return SyncOutcome::AlreadyRunning;
        };

        let credentials = self.credentials.snapshot();
        if !credentials.is_authenticated() {
            tracing::debug!(%platform, "No credentials, skipping sync");
            return SyncOutcome::Unauthenticated;
        }

        let report = self.run(&credentials).await;
        tracing::info!(
            %platform,
            pages = report.pages_fetched,
            new_items = report.new_items,
            persisted = report.items_persisted,
            thread_items = report.thread_items_persisted,
            stop_reason = %report.stop_reason,
            "Sync finished"
        );
        SyncOutcome::Completed(report)
    }

    async fn run(&self, credentials: &Credentials) -> SyncReport {
        let latest = match self.sink.latest_top_level_item().await {
            Ok(latest) => latest,
            Err(error) => {
                tracing::warn!("Failed to read sync cursor: {}", error);
                return SyncReport::empty(StopReason::Failed);
            }
        };
        let cursor = SyncCursor::from_latest(latest.as_ref(), self.policy.default_latest_rank);
        let mut ranks = OrderAssigner::new(&cursor, self.policy.rank_window());
        let reference_ranks = Arc::new(ReferenceRanks::below(cursor.latest_known_rank));
        let backfiller = Arc::new(ThreadBackfiller::new(
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            Arc::clone(&reference_ranks),
        ));
        let access_token: Arc<str> = Arc::from(credentials.access_token.as_str());

        let fetcher = ListingFetcher::new(
            self.source.as_ref(),
            &credentials.access_token,
            &credentials.account_id,
            self.policy.page_size,
        );
        let mut paginator = Paginator::new(fetcher).with_ceiling(self.policy.max_items);
        if let Some(id) = cursor.latest_known_id.as_deref() {
            paginator = paginator.with_boundary(id, self.policy.boundary);
        }

        let mut report = SyncReport::empty(StopReason::Exhausted);
        let mut tasks = JoinSet::new();
        let mut window_exhausted = false;

        while let Some(page) = paginator.next_page().await {
            let page = match page {
                Ok(page) => page,
                Err(error) if error.is_unauthorized() => {
                    tracing::info!("Access token rejected, refreshing once");
                    report.refresh_attempted = true;
                    report.refreshed =
                        self.credentials.refresh(&credentials.refresh_token).await;
                    break;
                }
                Err(error) => {
                    tracing::warn!("Page fetch failed, ending walk: {}", error);
                    break;
                }
            };

            // Ranks and backfill eligibility are fixed here, before fan-out.
            let mut work: Vec<(ItemGraph, bool)> = Vec::with_capacity(page.len());
            for PagedItem { mut graph, is_new } in page {
                let Some(rank) = ranks.next_rank() else {
                    window_exhausted = true;
                    break;
                };
                graph.root.rank = rank;
                graph.root.is_referenced = false;
                for referenced in &mut graph.referenced {
                    referenced.is_referenced = true;
                }
                reference_ranks.stamp(&mut graph.referenced);
                if is_new {
                    report.new_items += 1;
                }
                work.push((graph, is_new && self.policy.backfill_threads));
            }

            for (graph, backfill) in work {
                let sink = Arc::clone(&self.sink);
                let backfiller = Arc::clone(&backfiller);
                let access_token = Arc::clone(&access_token);
                tasks.spawn(async move {
                    persist_item(
                        sink.as_ref(),
                        backfiller.as_ref(),
                        &access_token,
                        graph,
                        backfill,
                    )
                    .await
                });
            }

            if window_exhausted {
                tracing::warn!("Rank window exhausted, ending walk");
                break;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(error) => {
                    tracing::warn!("Item task failed: {}", error);
                    report.persist_failures += 1;
                }
            }
        }

        report.pages_fetched = paginator.pages_fetched();
        report.items_fetched = paginator.items_fetched();
        report.stop_reason = paginator.stop_reason().unwrap_or(StopReason::Ceiling);
        report
    }
}

async fn persist_item<S: BookmarkSource, L: BookmarkSink>(
    sink: &L,
    backfiller: &ThreadBackfiller<S, L>,
    access_token: &str,
    graph: ItemGraph,
    backfill: bool,
) -> ItemOutcome {
    let persisted = match sink.insert_graph(&graph).await {
        Ok(inserted) => Some(inserted),
        Err(error) => {
            tracing::warn!(item = graph.id(), "Failed to persist item: {}", error);
            None
        }
    };

    let backfill = if backfill {
        match backfiller.backfill(access_token, &graph.root).await {
            Some(count) => BackfillOutcome::Persisted(count),
            None => BackfillOutcome::Failed,
        }
    } else {
        BackfillOutcome::Skipped
    };

    ItemOutcome {
        persisted,
        backfill,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::auth::testing::FakeRefresher;
    use crate::models::Platform;
    use crate::services::BookmarkStore;
    use crate::sync::testing::{reddit_post, reply, tweet, FakePage, FakeSource};
    use crate::sync::BoundaryMode;

    type Coordinator = SyncCoordinator<FakeSource, BookmarkStore, FakeRefresher>;

    struct Harness {
        coordinator: Arc<Coordinator>,
        source: Arc<FakeSource>,
        store: BookmarkStore,
        refresher: FakeRefresher,
    }

    async fn harness(source: FakeSource, policy: SyncPolicy) -> Harness {
        harness_with(source, policy, Credentials::new("abc", "r1", "u1")).await
    }

    async fn harness_with(
        source: FakeSource,
        policy: SyncPolicy,
        credentials: Credentials,
    ) -> Harness {
        let platform = source.platform();
        let source = Arc::new(source);
        let store = BookmarkStore::open_in_memory(platform).await.unwrap();
        let refresher = FakeRefresher::default();
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&source),
            Arc::new(store.clone()),
            Arc::new(CredentialStore::new(refresher.clone(), credentials)),
            policy,
        ));
        Harness {
            coordinator,
            source,
            store,
            refresher,
        }
    }

    fn completed(outcome: SyncOutcome) -> SyncReport {
        match outcome {
            SyncOutcome::Completed(report) => report,
            other => panic!("expected a completed run, got {other:?}"),
        }
    }

    fn items(graphs: Vec<ItemGraph>) -> FakePage {
        FakePage::Items(graphs)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_sync_ranks_above_default() {
        let h = harness(
            FakeSource::new(Platform::Twitter, vec![items(vec![tweet("5")])]),
            SyncPolicy::twitter(),
        )
        .await;

        let report = completed(h.coordinator.sync().await);

        let stored = h.store.list_top_level(10, 0).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "5");
        assert_eq!(stored[0].rank, 1250);
        assert_eq!(report.stop_reason, StopReason::Exhausted);
        assert_eq!(report.new_items, 1);
        assert_eq!(h.source.tokens_seen(), vec!["abc".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ranks_follow_fetch_order_above_latest() {
        let h = harness(
            FakeSource::new(
                Platform::Twitter,
                vec![
                    items(vec![tweet("30"), tweet("29")]),
                    items(vec![tweet("28")]),
                ],
            ),
            SyncPolicy::twitter(),
        )
        .await;
        let mut existing = tweet("1");
        existing.root.rank = 1300;
        h.store.insert_graph(&existing).await.unwrap();

        completed(h.coordinator.sync().await);

        let mut ranks = Vec::new();
        for id in ["30", "29", "28"] {
            ranks.push(h.store.get(id).await.unwrap().unwrap().rank);
        }
        assert_eq!(ranks, vec![1550, 1549, 1548]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stops_at_known_boundary() {
        let h = harness(
            FakeSource::new(
                Platform::Twitter,
                vec![
                    items(vec![tweet("105"), tweet("104"), tweet("103")]),
                    items(vec![tweet("102"), tweet("101"), tweet("100"), tweet("99")]),
                ],
            ),
            SyncPolicy {
                backfill_threads: false,
                ..SyncPolicy::twitter()
            },
        )
        .await;
        h.store.insert_graph(&tweet("100")).await.unwrap();

        let report = completed(h.coordinator.sync().await);

        assert_eq!(report.stop_reason, StopReason::Boundary);
        assert_eq!(report.new_items, 5);
        assert!(h.store.get("99").await.unwrap().is_none());
        let ids: Vec<String> = h
            .store
            .list_top_level(10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["105", "104", "103", "102", "101", "100"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backfill_stops_at_known_boundary() {
        let mut source = FakeSource::new(
            Platform::Reddit,
            vec![
                items(vec![reddit_post("t3_a"), reddit_post("t3_b")]),
                items(vec![reddit_post("t3_c"), reddit_post("t3_d")]),
            ],
        );
        for id in ["t3_a", "t3_b", "t3_c", "t3_d"] {
            source = source.with_thread(id, vec![vec![]]);
        }
        let h = harness(source, SyncPolicy::reddit()).await;
        h.store.insert_graph(&reddit_post("t3_c")).await.unwrap();

        let report = completed(h.coordinator.sync().await);

        let mut backfilled = h.source.thread_calls();
        backfilled.sort();
        assert_eq!(backfilled, vec!["t3_a".to_string(), "t3_b".to_string()]);
        assert_eq!(report.backfills_started, 2);
        assert_eq!(report.items_fetched, 4);
        assert!(h.store.get("t3_d").await.unwrap().is_some());
        assert_eq!(report.stop_reason, StopReason::Exhausted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backfilled_threads_are_referenced() {
        let source = FakeSource::new(Platform::Twitter, vec![items(vec![tweet("10")])])
            .with_thread("10", vec![vec![tweet("10"), reply("11", "10")]]);
        let h = harness(source, SyncPolicy::twitter()).await;

        let report = completed(h.coordinator.sync().await);

        assert_eq!(report.thread_items_persisted, 1);
        assert_eq!(h.store.count().await.unwrap(), 1);
        let reply = h.store.get("11").await.unwrap().unwrap();
        assert!(reply.is_referenced);
        assert!(reply.rank < 1000);
        assert_eq!(h.store.list_thread("10").await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_backfill_keeps_top_level_item() {
        let source = FakeSource::new(Platform::Twitter, vec![items(vec![tweet("10")])])
            .with_thread("10", vec![vec![reply("11", "10")]])
            .failing_thread_page("10", 0);
        let h = harness(source, SyncPolicy::twitter()).await;

        let report = completed(h.coordinator.sync().await);

        assert_eq!(report.backfills_failed, 1);
        assert!(h.store.get("10").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn page_failure_keeps_earlier_pages() {
        let h = harness(
            FakeSource::new(
                Platform::Twitter,
                vec![
                    items(vec![tweet("3"), tweet("2")]),
                    FakePage::NetworkError,
                    items(vec![tweet("1")]),
                ],
            ),
            SyncPolicy::twitter(),
        )
        .await;

        let report = completed(h.coordinator.sync().await);

        assert_eq!(report.stop_reason, StopReason::Failed);
        assert!(!report.refresh_attempted);
        assert!(h.store.get("3").await.unwrap().is_some());
        assert!(h.store.get("2").await.unwrap().is_some());
        assert!(h.store.get("1").await.unwrap().is_none());
        assert_eq!(h.refresher.calls.load(Ordering::SeqCst), 0);
        assert!(!h.coordinator.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unauthorized_refreshes_exactly_once() {
        let h = harness(
            FakeSource::new(
                Platform::Twitter,
                vec![FakePage::Unauthorized, items(vec![tweet("1")])],
            ),
            SyncPolicy::twitter(),
        )
        .await;

        let report = completed(h.coordinator.sync().await);

        assert!(report.refresh_attempted);
        assert!(report.refreshed);
        assert_eq!(h.refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.source.page_calls(), 1);
        assert_eq!(h.store.count().await.unwrap(), 0);
        assert_eq!(
            h.coordinator.credentials().snapshot(),
            Credentials::new("fresh-access", "r1", "u1")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn incomplete_credentials_skip_network() {
        for credentials in [
            Credentials::new("abc", "", "u1"),
            Credentials::new("abc", "r1", " "),
        ] {
            let h = harness_with(
                FakeSource::new(Platform::Twitter, vec![items(vec![tweet("1")])]),
                SyncPolicy::twitter(),
                credentials,
            )
            .await;

            assert_eq!(h.coordinator.sync().await, SyncOutcome::Unauthenticated);
            assert_eq!(h.source.page_calls(), 0);
            assert_eq!(h.store.count().await.unwrap(), 0);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_sync_is_single_flight() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::new(Platform::Twitter, vec![items(vec![tweet("1")])])
            .gated(Arc::clone(&gate));
        let h = harness(source, SyncPolicy::twitter()).await;
        let entered = Arc::clone(&h.source.entered);

        let first = h.coordinator.spawn_sync();
        entered.notified().await;
        assert!(h.coordinator.is_running());

        assert_eq!(h.coordinator.sync().await, SyncOutcome::AlreadyRunning);
        assert_eq!(h.source.page_calls(), 1);

        gate.add_permits(1);
        let report = completed(
            tokio::time::timeout(Duration::from_secs(5), first)
                .await
                .unwrap()
                .unwrap(),
        );
        assert_eq!(report.new_items, 1);
        assert!(!h.coordinator.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_sync_is_idempotent() {
        let pages = || {
            vec![
                items(vec![tweet("3"), tweet("2")]),
                items(vec![tweet("1")]),
            ]
        };
        let h = harness(
            FakeSource::new(Platform::Twitter, pages()),
            SyncPolicy::twitter(),
        )
        .await;

        completed(h.coordinator.sync().await);
        let first = h.store.list_top_level(10, 0).await.unwrap();

        let report = completed(h.coordinator.sync().await);
        let second = h.store.list_top_level(10, 0).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(report.new_items, 0);
        assert_eq!(report.items_persisted, 0);
        assert_eq!(report.stop_reason, StopReason::Boundary);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn gate_mode_rerun_inserts_nothing_new() {
        let h = harness(
            FakeSource::new(
                Platform::Reddit,
                vec![items(vec![reddit_post("t3_a"), reddit_post("t3_b")])],
            ),
            SyncPolicy {
                boundary: BoundaryMode::GateBackfillOnly,
                backfill_threads: false,
                ..SyncPolicy::reddit()
            },
        )
        .await;

        completed(h.coordinator.sync().await);
        let report = completed(h.coordinator.sync().await);

        assert_eq!(report.items_fetched, 2);
        assert_eq!(report.new_items, 0);
        assert_eq!(report.items_persisted, 0);
        assert_eq!(h.store.count().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bookmark_seen_first_in_a_thread_is_promoted() {
        let source = FakeSource::new(
            Platform::Twitter,
            vec![items(vec![reply("11", "10")]), items(vec![tweet("10")])],
        )
        .with_thread("10", vec![vec![tweet("10"), reply("11", "10")]]);
        let h = harness(source, SyncPolicy::twitter()).await;

        let report = completed(h.coordinator.sync().await);
        assert_eq!(report.new_items, 2);

        let feed = h.store.list_top_level(10, 0).await.unwrap();
        let ranked: Vec<(&str, i64)> = feed
            .iter()
            .map(|item| (item.id.as_str(), item.rank))
            .collect();
        assert_eq!(ranked, vec![("11", 1250), ("10", 1249)]);
        assert!(feed.iter().all(|item| !item.is_referenced));
        assert_eq!(h.store.count().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bookmarking_a_stored_thread_item_promotes_it() {
        let h = harness(
            FakeSource::new(
                Platform::Twitter,
                vec![items(vec![tweet("21"), tweet("20")])],
            ),
            SyncPolicy {
                backfill_threads: false,
                ..SyncPolicy::twitter()
            },
        )
        .await;
        let mut earlier = tweet("20");
        earlier.root.rank = 1300;
        let mut quoted = tweet("21").root.referenced();
        quoted.rank = 999;
        earlier.referenced.push(quoted);
        h.store.insert_graph(&earlier).await.unwrap();

        let report = completed(h.coordinator.sync().await);
        assert_eq!(report.new_items, 1);
        assert_eq!(report.items_persisted, 1);

        let feed = h.store.list_top_level(10, 0).await.unwrap();
        let ranked: Vec<(&str, i64)> = feed
            .iter()
            .map(|item| (item.id.as_str(), item.rank))
            .collect();
        assert_eq!(ranked, vec![("21", 1550), ("20", 1300)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ceiling_ends_long_walk_with_distinct_ranks() {
        let pages: Vec<FakePage> = (0..4)
            .map(|page| {
                items(
                    (0..100)
                        .map(|index| reddit_post(&format!("t3_{page}_{index:03}")))
                        .collect(),
                )
            })
            .collect();
        let h = harness(
            FakeSource::new(Platform::Reddit, pages),
            SyncPolicy {
                max_items: 300,
                backfill_threads: false,
                ..SyncPolicy::reddit()
            },
        )
        .await;

        let report = completed(h.coordinator.sync().await);
        assert_eq!(report.stop_reason, StopReason::Ceiling);
        assert_eq!(report.items_fetched, 300);
        assert_eq!(report.new_items, 300);
        assert_eq!(h.source.page_calls(), 3);

        let feed = h.store.list_top_level(1000, 0).await.unwrap();
        assert_eq!(feed.len(), 300);
        let expected: Vec<String> = (0..3)
            .flat_map(|page| (0..100).map(move |index| format!("t3_{page}_{index:03}")))
            .collect();
        let ids: Vec<String> = feed.iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, expected);
        assert_eq!(feed[0].rank, 1300);
        assert!(feed.windows(2).all(|pair| pair[0].rank > pair[1].rank));
        assert!(feed.iter().all(|item| item.rank > 1000));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_reddit_sync_ranks_from_1800() {
        let h = harness(
            FakeSource::new(Platform::Reddit, vec![items(vec![reddit_post("t3_a")])]),
            SyncPolicy {
                backfill_threads: false,
                ..SyncPolicy::reddit()
            },
        )
        .await;

        completed(h.coordinator.sync().await);
        assert_eq!(h.store.get("t3_a").await.unwrap().unwrap().rank, 1800);
    }
}
