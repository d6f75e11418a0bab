//! Per-context navigation state machine.
//!
//! One [`NavigationContext`] exists per browsing context: the main view
//! and the destination picker each own an independent instance. The two
//! never share mutable state; anything crossing between them is passed
//! explicitly at workflow boundaries.
//!
//! Every context enforces the stale-response guard of one logical
//! navigation stream: each refresh carries a monotonically increasing
//! sequence number and only the most recently issued request may apply its
//! result, so a slow listing response can never clobber a newer navigation
//! target.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::TreeCache;
use crate::path;
use crate::store::{Entry, Listing, RemoteStore, StoreError};

/// Mutable state of one context.
#[derive(Debug, Default)]
struct NavigationState {
    current_path: String,
    listing: Option<Listing>,
    is_loading: bool,
}

/// Outcome of [`NavigationContext::navigate`].
#[derive(Debug, Clone)]
pub enum Navigated {
    /// The entry was a folder; the context moved into it.
    Descended,
    /// The entry was a file; position is unchanged and the file is handed
    /// back for the owner to treat as its selection.
    Selected(Entry),
}

/// The file currently targeted for preview or relocation. Owned by the
/// caller, not by any context. Contexts only signal selections.
#[derive(Debug, Clone)]
pub struct Selection {
    pub upload_id: String,
    pub path: String,
    pub name: String,
}

impl Selection {
    /// Build a selection from a file entry. Folders and files without an
    /// upload id cannot be selected.
    pub fn from_entry(entry: &Entry) -> Option<Self> {
        if entry.is_folder {
            return None;
        }
        entry.upload_id.as_ref().map(|id| Self {
            upload_id: id.clone(),
            path: entry.path.clone(),
            name: entry.name.clone(),
        })
    }

    /// Whether the selected file is still part of a listing. Owners must
    /// drop a selection once a reload no longer contains it.
    pub fn still_present(&self, listing: &Listing) -> bool {
        listing.contains_upload(&self.upload_id)
    }
}

/// One independent browsing context over the remote store.
pub struct NavigationContext {
    label: &'static str,
    store: Arc<dyn RemoteStore>,
    cache: Arc<TreeCache>,
    state: Mutex<NavigationState>,
    refresh_seq: AtomicU64,
    folders_only: bool,
}

impl NavigationContext {
    /// Context for the main view: folders and files are both visible.
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<TreeCache>) -> Self {
        Self::with_mode("main", store, cache, false)
    }

    /// Context for the destination picker: only folders are visible.
    pub fn picker(store: Arc<dyn RemoteStore>, cache: Arc<TreeCache>) -> Self {
        Self::with_mode("picker", store, cache, true)
    }

    fn with_mode(
        label: &'static str,
        store: Arc<dyn RemoteStore>,
        cache: Arc<TreeCache>,
        folders_only: bool,
    ) -> Self {
        Self {
            label,
            store,
            cache,
            state: Mutex::new(NavigationState::default()),
            refresh_seq: AtomicU64::new(0),
            folders_only,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub async fn current_path(&self) -> String {
        self.state.lock().await.current_path.clone()
    }

    pub async fn listing(&self) -> Option<Listing> {
        self.state.lock().await.listing.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.is_loading
    }

    /// Entries this context exposes: folders first, then files unless this
    /// is a folders-only (picker) context.
    pub async fn visible(&self) -> Vec<Entry> {
        let state = self.state.lock().await;
        match &state.listing {
            Some(listing) => {
                let mut out = listing.folders.clone();
                if !self.folders_only {
                    out.extend(listing.files.iter().cloned());
                }
                out
            }
            None => Vec::new(),
        }
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    /// Descend into a folder entry, or signal a file entry back to the
    /// owner as a selection without moving.
    pub async fn navigate(&self, entry: &Entry) -> Result<Navigated, StoreError> {
        if !entry.is_folder {
            debug!("[{}] selected file {}", self.label, entry.path);
            return Ok(Navigated::Selected(entry.clone()));
        }
        self.set_path(path::normalize(&entry.path)).await;
        self.refresh().await?;
        Ok(Navigated::Descended)
    }

    /// Jump directly to a folder path.
    pub async fn open_folder(&self, folder_path: &str) -> Result<(), StoreError> {
        self.set_path(path::normalize(folder_path)).await;
        self.refresh().await
    }

    /// Move to the parent folder. At the root this is a no-op.
    pub async fn up(&self) -> Result<(), StoreError> {
        {
            let mut state = self.state.lock().await;
            if state.current_path.is_empty() {
                return Ok(());
            }
            state.current_path = path::parent(&state.current_path);
        }
        self.refresh().await
    }

    /// Picker alias for [`up`](NavigationContext::up).
    pub async fn back(&self) -> Result<(), StoreError> {
        self.up().await
    }

    /// Jump back to the share root.
    pub async fn root(&self) -> Result<(), StoreError> {
        self.set_path(String::new()).await;
        self.refresh().await
    }

    async fn set_path(&self, new_path: String) {
        self.state.lock().await.current_path = new_path;
    }

    /// Reload the listing for the current path, serving from the cache
    /// when possible.
    ///
    /// The server-confirmed `current_path` in the response is adopted even
    /// when it differs from the requested path (the store redirects to the
    /// nearest valid ancestor when a folder was deleted concurrently); the
    /// engine never substitutes a guess of its own. On failure the prior
    /// listing stays intact and the error is surfaced; the position is not
    /// silently reset.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let requested = {
            let mut state = self.state.lock().await;
            state.is_loading = true;
            state.current_path.clone()
        };

        if let Some(listing) = self.cache.get(&requested) {
            let mut state = self.state.lock().await;
            if self.refresh_seq.load(Ordering::SeqCst) == seq {
                state.current_path = listing.current_path.clone();
                state.listing = Some(listing);
                state.is_loading = false;
            }
            return Ok(());
        }

        let result = self.store.list(&requested).await;

        let mut state = self.state.lock().await;
        if self.refresh_seq.load(Ordering::SeqCst) != seq {
            // a newer request superseded this one while it was in flight
            debug!("[{}] dropping stale listing for '{}'", self.label, requested);
            return Ok(());
        }
        match result {
            Ok(listing) => {
                if listing.current_path != requested {
                    debug!(
                        "[{}] server redirected '{}' -> '{}'",
                        self.label, requested, listing.current_path
                    );
                }
                self.cache.put(listing.clone());
                state.current_path = listing.current_path.clone();
                state.listing = Some(listing);
                state.is_loading = false;
                Ok(())
            }
            Err(e) => {
                warn!("[{}] refresh of '{}' failed: {}", self.label, requested, e);
                state.is_loading = false;
                Err(e)
            }
        }
    }

    // ─── Tree mutations issued from this context ─────────────────────────

    /// Delete an entry, then reload holding the current position. Cache
    /// invalidation for the affected paths lands before this returns.
    pub async fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        self.store.delete(&entry.path).await?;
        self.cache.invalidate(&entry.path);
        self.cache.invalidate(&path::parent(&entry.path));
        self.refresh().await
    }

    /// Create a folder under the current path. Empty names are rejected
    /// before any request goes out.
    pub async fn create_folder(&self, name: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Rejected(
                "Folder name cannot be empty.".to_string(),
            ));
        }
        let parent = self.current_path().await;
        let message = self.store.create_folder(&parent, name).await?;
        self.cache.invalidate(&parent);
        self.refresh().await?;
        Ok(message)
    }
}
