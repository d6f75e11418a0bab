//! In-memory listing cache shared by both navigation contexts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::path;
use crate::store::Listing;

/// Cap on cached listings; the whole map is dropped on overflow and
/// repopulates through navigation.
const MAX_ENTRIES: usize = 1024;

/// Snapshot cache of fetched listings, keyed by the server-confirmed
/// `current_path` of each listing, never by the path that was requested.
///
/// Any operation that mutates the tree (delete, move, create folder) must
/// invalidate the affected paths before it returns, so a follow-up refresh
/// cannot observe a stale entry. The mutation generation counter lets
/// consumers holding derived snapshots (the search controller's full-tree
/// snapshot) detect that they are stale too.
#[derive(Default)]
pub struct TreeCache {
    map: Mutex<HashMap<String, Listing>>,
    generation: AtomicU64,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, folder_path: &str) -> Option<Listing> {
        let map = self.map.lock().unwrap();
        map.get(&path::normalize(folder_path)).cloned()
    }

    /// Store a listing under its confirmed `current_path`.
    pub fn put(&self, listing: Listing) {
        let mut map = self.map.lock().unwrap();
        if map.len() >= MAX_ENTRIES {
            debug!("listing cache reached {} entries, evicting all", map.len());
            map.clear();
        }
        map.insert(listing.current_path.clone(), listing);
    }

    /// Drop one path. The next `get` for it misses, forcing a refetch.
    pub fn invalidate(&self, folder_path: &str) {
        self.map.lock().unwrap().remove(&path::normalize(folder_path));
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn invalidate_all(&self) {
        self.map.lock().unwrap().clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Monotonic counter bumped by every invalidation. Derived snapshots
    /// record it at build time and rebuild when it has moved.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
