//! In-memory store double backing the engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Entry, Listing, RemoteStore, SearchHits, StoreError};
use crate::path;

/// Scriptable in-memory tree. Paths that no longer exist fall back to the
/// nearest valid ancestor, mirroring the server's deleted-path redirect.
#[derive(Default)]
pub(crate) struct MockStore {
    tree: Mutex<HashMap<String, Listing>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<Vec<String>>,
    search_failing: Mutex<bool>,
    searchable: bool,
    pub list_calls: AtomicU64,
    pub search_calls: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        let store = Self::default();
        store
            .tree
            .lock()
            .unwrap()
            .insert(String::new(), Listing::empty(""));
        store
    }

    pub fn with_search(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Add a folder, creating intermediate folders as needed.
    pub fn add_folder(&self, folder_path: &str) {
        let folder_path = path::normalize(folder_path);
        let mut tree = self.tree.lock().unwrap();
        let mut built = String::new();
        for segment in path::segments(&folder_path) {
            let child = path::join(&built, &segment);
            if !tree.contains_key(&child) {
                tree.insert(child.clone(), Listing::empty(child.clone()));
                let parent = tree.get_mut(&built).expect("parent exists");
                parent.folders.push(Entry::folder(segment.clone(), child.clone()));
            }
            built = child;
        }
    }

    /// Add a file under its parent folder (which must already exist or be
    /// creatable from the path).
    pub fn add_file(&self, file_path: &str, upload_id: &str, size: u64) {
        let file_path = path::normalize(file_path);
        let parent = path::parent(&file_path);
        if !parent.is_empty() {
            self.add_folder(&parent);
        }
        let mut tree = self.tree.lock().unwrap();
        let dir = tree.get_mut(&parent).expect("parent exists");
        dir.files.push(Entry::file(
            path::file_name(&file_path),
            file_path.clone(),
            upload_id,
            size,
        ));
    }

    /// Delay list responses for one path.
    pub fn delay_list(&self, folder_path: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(path::normalize(folder_path), delay);
    }

    /// Make listing one path fail with a transient error.
    pub fn fail_list(&self, folder_path: &str) {
        self.failing.lock().unwrap().push(path::normalize(folder_path));
    }

    /// Make every following search fail with a transient error.
    pub fn fail_search(&self) {
        *self.search_failing.lock().unwrap() = true;
    }

    fn nearest_existing(&self, requested: &str) -> Listing {
        let tree = self.tree.lock().unwrap();
        let mut candidate = path::normalize(requested);
        loop {
            if let Some(listing) = tree.get(&candidate) {
                return listing.clone();
            }
            if candidate.is_empty() {
                return Listing::empty("");
            }
            candidate = path::parent(&candidate);
        }
    }

    fn all_entries_under(&self, scope: &str) -> Vec<Entry> {
        let scope = path::normalize(scope);
        let tree = self.tree.lock().unwrap();
        let mut out = Vec::new();
        for (dir_path, listing) in tree.iter() {
            let in_scope = scope.is_empty()
                || dir_path == &scope
                || dir_path.starts_with(&format!("{}/", scope));
            if in_scope {
                out.extend(listing.folders.iter().cloned());
                out.extend(listing.files.iter().cloned());
            }
        }
        out
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn list(&self, folder_path: &str) -> Result<Listing, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let normalized = path::normalize(folder_path);
        let delay = self.delays.lock().unwrap().get(&normalized).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&normalized) {
            return Err(StoreError::Transient(format!(
                "listing {} failed",
                normalized
            )));
        }
        Ok(self.nearest_existing(&normalized))
    }

    fn supports_search(&self) -> bool {
        self.searchable
    }

    async fn search(&self, query: &str, scope: &str) -> Result<SearchHits, StoreError> {
        if !self.searchable {
            return Err(StoreError::Unsupported("search".to_string()));
        }
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if *self.search_failing.lock().unwrap() {
            return Err(StoreError::Transient("search failed".to_string()));
        }
        let needle = query.to_lowercase();
        let mut hits = SearchHits::default();
        for entry in self.all_entries_under(scope) {
            if entry.name.to_lowercase().contains(&needle) {
                if entry.is_folder {
                    hits.folders.push(entry);
                } else {
                    hits.files.push(entry);
                }
            }
        }
        Ok(hits)
    }

    async fn move_file(
        &self,
        upload_id: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<String, StoreError> {
        let old_path = path::normalize(old_path);
        let new_path = path::normalize(new_path);
        let old_parent = path::parent(&old_path);
        let new_parent = path::parent(&new_path);
        let new_name = path::file_name(&new_path);

        let mut tree = self.tree.lock().unwrap();

        let collision = tree
            .get(&new_parent)
            .map(|dir| dir.files.iter().any(|f| f.name == new_name))
            .unwrap_or(false);
        if collision {
            return Err(StoreError::Conflict(format!(
                "a file named '{}' already exists at that location",
                new_name
            )));
        }

        let removed = tree.get_mut(&old_parent).and_then(|dir| {
            let idx = dir
                .files
                .iter()
                .position(|f| f.upload_id.as_deref() == Some(upload_id))?;
            Some(dir.files.remove(idx))
        });
        let mut moved = match removed {
            Some(entry) => entry,
            None => {
                return Err(StoreError::NotFound(format!(
                    "upload id {} not found",
                    upload_id
                )))
            }
        };

        moved.name = new_name;
        moved.path = new_path.clone();
        tree.entry(new_parent.clone())
            .or_insert_with(|| Listing::empty(new_parent))
            .files
            .push(moved);
        Ok(format!("Path updated for upload_id {}", upload_id))
    }

    async fn delete(&self, item_path: &str) -> Result<(), StoreError> {
        let item_path = path::normalize(item_path);
        let parent = path::parent(&item_path);
        let name = path::file_name(&item_path);
        let mut tree = self.tree.lock().unwrap();

        if tree.contains_key(&item_path) && !item_path.is_empty() {
            // folder: drop the subtree and the parent's entry
            tree.retain(|key, _| {
                key != &item_path && !key.starts_with(&format!("{}/", item_path))
            });
            if let Some(dir) = tree.get_mut(&parent) {
                dir.folders.retain(|f| f.name != name);
            }
            return Ok(());
        }

        if let Some(dir) = tree.get_mut(&parent) {
            if let Some(idx) = dir.files.iter().position(|f| f.name == name) {
                dir.files.remove(idx);
                return Ok(());
            }
        }
        Err(StoreError::NotFound(format!("{} not found", item_path)))
    }

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<String, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Rejected(
                "Folder name cannot be empty".to_string(),
            ));
        }
        let parent = path::normalize(parent_path);
        let child = path::join(&parent, name);
        {
            let tree = self.tree.lock().unwrap();
            if tree.contains_key(&child) {
                return Err(StoreError::Conflict(format!(
                    "Folder '{}' already exists",
                    name
                )));
            }
        }
        self.add_folder(&child);
        Ok(format!("Folder '{}' created successfully.", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_falls_back_to_nearest_ancestor() {
        let store = MockStore::new();
        store.add_folder("docs/reports");
        let listing = store.list("docs/reports/ghost/deeper").await.unwrap();
        assert_eq!(listing.current_path, "docs/reports");
    }

    #[tokio::test]
    async fn test_move_then_list_old_and_new() {
        let store = MockStore::new();
        store.add_folder("old");
        store.add_folder("new");
        store.add_file("old/x.txt", "11", 5);

        store.move_file("11", "old/x.txt", "new/x.txt").await.unwrap();

        let old = store.list("old").await.unwrap();
        assert!(!old.files.iter().any(|f| f.name == "x.txt"));
        let new = store.list("new").await.unwrap();
        assert!(new.contains_upload("11"));
    }

    #[tokio::test]
    async fn test_double_delete_is_not_found_both_times() {
        let store = MockStore::new();
        store.add_file("a.txt", "1", 1);
        store.delete("a.txt").await.unwrap();
        for _ in 0..2 {
            match store.delete("a.txt").await {
                Err(StoreError::NotFound(_)) => {}
                other => panic!("expected NotFound, got {:?}", other.err()),
            }
        }
    }

    #[tokio::test]
    async fn test_move_conflict() {
        let store = MockStore::new();
        store.add_folder("dst");
        store.add_file("src/x.txt", "1", 1);
        store.add_file("dst/x.txt", "2", 1);
        match store.move_file("1", "src/x.txt", "dst/x.txt").await {
            Err(StoreError::Conflict(_)) => {}
            other => panic!("expected Conflict, got {:?}", other.err()),
        }
    }
}
