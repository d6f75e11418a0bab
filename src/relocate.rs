//! Move-a-file workflow built on the destination picker.
//!
//! The workflow captures the selected file, opens an independent picker
//! context at the share root and derives the candidate destination from
//! wherever the picker currently sits. Committing rewrites the upload's
//! logical path through the store; the main view's position is never
//! disturbed, whether the move succeeds or fails.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::TreeCache;
use crate::navigation::{NavigationContext, Selection};
use crate::path;
use crate::store::{Entry, RemoteStore, StoreError};

pub struct RelocateWorkflow {
    store: Arc<dyn RemoteStore>,
    cache: Arc<TreeCache>,
    main: Arc<NavigationContext>,
    picker: NavigationContext,
    selection: Selection,
}

impl std::fmt::Debug for RelocateWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelocateWorkflow")
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl RelocateWorkflow {
    /// Start relocating one file: capture its identity and open a fresh
    /// picker context at the root. Only file entries with an upload id can
    /// be relocated.
    pub async fn begin(
        store: Arc<dyn RemoteStore>,
        cache: Arc<TreeCache>,
        main: Arc<NavigationContext>,
        file: &Entry,
    ) -> Result<Self, StoreError> {
        let selection = Selection::from_entry(file).ok_or_else(|| {
            StoreError::Rejected("only files with an upload id can be moved".to_string())
        })?;
        let picker = NavigationContext::picker(store.clone(), cache.clone());
        picker.root().await?;
        Ok(Self {
            store,
            cache,
            main,
            picker,
            selection,
        })
    }

    /// The picker context. Navigating it recomputes the candidate path;
    /// the main context is untouched by anything done here.
    pub fn picker(&self) -> &NavigationContext {
        &self.picker
    }

    /// The file being relocated.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Destination derived from the picker's current folder and the file's
    /// own name.
    pub async fn candidate_path(&self) -> String {
        path::join(&self.picker.current_path().await, &self.selection.name)
    }

    /// Rewrite the file's path to the current candidate.
    ///
    /// On success the listings of both affected parents are invalidated
    /// before the main context reloads. On failure nothing is touched and
    /// the workflow stays open for another attempt. `Conflict` means the
    /// destination needs to change, `NotFound` means the file itself is
    /// gone.
    pub async fn commit(&self) -> Result<String, StoreError> {
        let new_path = self.candidate_path().await;
        if new_path.is_empty() {
            return Err(StoreError::Rejected("no destination selected".to_string()));
        }
        let old_path = self.selection.path.clone();

        let message = self
            .store
            .move_file(&self.selection.upload_id, &old_path, &new_path)
            .await?;

        info!(
            "relocated upload {}: '{}' -> '{}'",
            self.selection.upload_id, old_path, new_path
        );
        self.cache.invalidate(&path::parent(&old_path));
        self.cache.invalidate(&path::parent(&new_path));
        if let Err(e) = self.main.refresh().await {
            // the move itself landed; a failed reload keeps the stale view
            // until the next refresh
            warn!("main refresh after relocate failed: {}", e);
        }
        Ok(message)
    }

    /// Drop the candidate state. Both contexts keep their listings.
    pub fn abort(self) {
        info!("relocate of upload {} aborted", self.selection.upload_id);
    }
}
