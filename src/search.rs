//! Debounced search over the share tree.
//!
//! Raw query strings stream in from keystrokes; each one is trimmed,
//! deduplicated against the previous submission and debounced by a short
//! quiescence window before any work happens. A generation counter plays
//! the same stale-guard role as the navigation sequence number: only the
//! most recently submitted query may apply its outcome.
//!
//! Deployments with a search endpoint get a remote, folder-scoped query;
//! the rest fall back to filtering a lazily built full-tree snapshot. The
//! result set is tagged with its provenance so consumers can tell a
//! canonical server answer from a possibly-stale local filter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::TreeCache;
use crate::navigation::NavigationContext;
use crate::store::{Entry, RemoteStore};

/// Quiescence window between the last keystroke and any search work.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(120);

/// Current pipeline activity. Settles back to `Idle` once a query has been
/// answered; the visible results and their provenance outlive the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Idle,
    LocalFiltering,
    RemotePending,
}

/// Where a displayed result set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Canonical answer from the store's search endpoint
    Remote,
    /// Filter over the locally accumulated full-tree snapshot
    Local,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub provenance: Provenance,
    /// Folders first, then case-insensitive by name
    pub entries: Vec<Entry>,
}

/// Full-tree snapshot for local filtering, valid for one cache generation.
struct TreeSnapshot {
    entries: Vec<Entry>,
    cache_generation: u64,
}

#[derive(Default)]
struct SearchState {
    query: String,
    mode: SearchMode,
    full_tree: Option<TreeSnapshot>,
    results: Option<SearchResults>,
}

/// Order entries for display: folders before files, then ascending by name
/// ignoring case.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.is_folder
            .cmp(&a.is_folder)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Debounced query pipeline bound to one navigation context.
///
/// The state lock is a plain mutex held only for field access, never
/// across an await.
pub struct SearchController {
    store: Arc<dyn RemoteStore>,
    cache: Arc<TreeCache>,
    context: Arc<NavigationContext>,
    state: Arc<Mutex<SearchState>>,
    generation: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl SearchController {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        cache: Arc<TreeCache>,
        context: Arc<NavigationContext>,
    ) -> Self {
        Self {
            store,
            cache,
            context,
            state: Arc::new(Mutex::new(SearchState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.state.lock().unwrap().mode
    }

    pub fn query(&self) -> String {
        self.state.lock().unwrap().query.clone()
    }

    pub fn results(&self) -> Option<SearchResults> {
        self.state.lock().unwrap().results.clone()
    }

    /// Entries the owning view should display: search results while a
    /// query is active, otherwise the context's own listing. An empty
    /// query therefore restores exactly the listing that was visible
    /// before searching; the context's listing is never replaced.
    pub async fn visible(&self) -> Vec<Entry> {
        if let Some(results) = self.results() {
            return results.entries;
        }
        self.context.visible().await
    }

    /// Submit one raw keystroke's worth of query text. Returns the handle
    /// of the spawned pipeline step so teardown paths and tests can await
    /// settlement; regular callers drop it.
    pub fn set_query(&self, raw: &str) -> JoinHandle<()> {
        let trimmed = raw.trim().to_string();

        {
            let mut state = self.state.lock().unwrap();
            // dedup: an identical consecutive submission re-triggers nothing
            if state.query == trimmed {
                debug!("duplicate query '{}' ignored", trimmed);
                return tokio::spawn(async {});
            }
            state.query = trimmed.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = self.store.clone();
        let cache = self.cache.clone();
        let context = self.context.clone();
        let state = self.state.clone();
        let generations = self.generation.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            // debounce: wait out the quiescence window, giving a newer
            // keystroke or teardown the chance to supersede this step
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(SEARCH_DEBOUNCE) => {}
            }
            if generations.load(Ordering::SeqCst) != generation {
                return;
            }

            if trimmed.is_empty() {
                let mut state = state.lock().unwrap();
                if generations.load(Ordering::SeqCst) == generation {
                    state.results = None;
                    state.mode = SearchMode::Idle;
                }
                return;
            }

            if store.supports_search() {
                run_remote(store, context, state, generations, generation, &trimmed).await;
            } else {
                run_local(store, cache, state, generations, generation, &trimmed).await;
            }
        })
    }

    /// Tear the pipeline down: pending debounce steps never fire again.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_remote(
    store: Arc<dyn RemoteStore>,
    context: Arc<NavigationContext>,
    state: Arc<Mutex<SearchState>>,
    generations: Arc<AtomicU64>,
    generation: u64,
    query: &str,
) {
    state.lock().unwrap().mode = SearchMode::RemotePending;
    let scope = context.current_path().await;

    match store.search(query, &scope).await {
        Ok(hits) => {
            let mut entries = hits.folders;
            entries.extend(hits.files);
            sort_entries(&mut entries);
            let mut state = state.lock().unwrap();
            if generations.load(Ordering::SeqCst) == generation {
                state.results = Some(SearchResults {
                    provenance: Provenance::Remote,
                    entries,
                });
                state.mode = SearchMode::Idle;
            }
        }
        Err(e) => {
            // previous results stay visible on a failed search
            warn!("remote search for '{}' failed: {}", query, e);
            let mut state = state.lock().unwrap();
            if generations.load(Ordering::SeqCst) == generation {
                state.mode = SearchMode::Idle;
            }
        }
    }
}

async fn run_local(
    store: Arc<dyn RemoteStore>,
    cache: Arc<TreeCache>,
    state: Arc<Mutex<SearchState>>,
    generations: Arc<AtomicU64>,
    generation: u64,
    query: &str,
) {
    state.lock().unwrap().mode = SearchMode::LocalFiltering;

    let snapshot = ensure_snapshot(&store, &cache, &state).await;
    let needle = query.to_lowercase();
    let mut entries: Vec<Entry> = snapshot
        .into_iter()
        .filter(|e| {
            e.name.to_lowercase().contains(&needle) || e.path.to_lowercase().contains(&needle)
        })
        .collect();
    sort_entries(&mut entries);

    let mut state = state.lock().unwrap();
    if generations.load(Ordering::SeqCst) == generation {
        state.results = Some(SearchResults {
            provenance: Provenance::Local,
            entries,
        });
        state.mode = SearchMode::Idle;
    }
}

/// Return the full-tree snapshot, rebuilding it when a tree mutation has
/// moved the cache generation since it was accumulated.
async fn ensure_snapshot(
    store: &Arc<dyn RemoteStore>,
    cache: &Arc<TreeCache>,
    state: &Arc<Mutex<SearchState>>,
) -> Vec<Entry> {
    {
        let state = state.lock().unwrap();
        if let Some(snapshot) = &state.full_tree {
            if snapshot.cache_generation == cache.generation() {
                return snapshot.entries.clone();
            }
        }
    }

    let cache_generation = cache.generation();
    let entries = walk_tree(store).await;
    let mut state = state.lock().unwrap();
    state.full_tree = Some(TreeSnapshot {
        entries: entries.clone(),
        cache_generation,
    });
    entries
}

/// Breadth-first walk of the whole tree from the root, via an explicit
/// worklist so deep trees cannot overflow the stack. A subtree whose
/// listing fails is skipped; the walk carries on with the rest.
async fn walk_tree(store: &Arc<dyn RemoteStore>) -> Vec<Entry> {
    let mut queue = VecDeque::from([String::new()]);
    let mut accumulated = Vec::new();
    while let Some(folder) = queue.pop_front() {
        match store.list(&folder).await {
            Ok(listing) => {
                for sub in &listing.folders {
                    queue.push_back(sub.path.clone());
                }
                accumulated.extend(listing.folders);
                accumulated.extend(listing.files);
            }
            Err(e) => {
                warn!("skipping subtree '{}' during tree walk: {}", folder, e);
            }
        }
    }
    accumulated
}
