//! Remote store abstraction.
//!
//! The share server is an opaque service behind the [`RemoteStore`] trait;
//! the engine only ever speaks this contract. One HTTP-backed
//! implementation ships in [`http`]. Remote search is an optional
//! capability: deployments without a search endpoint report
//! `supports_search() == false` and the search controller falls back to a
//! local tree walk.

pub mod http;
pub mod retry;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpStore;
pub use types::{Entry, Listing, SearchHits, StoreError};

use async_trait::async_trait;

/// Contract with the remote share store.
///
/// All paths crossing this boundary are canonical (see [`crate::path`]).
/// Implementations return canonicalized listings so engine state never
/// holds a non-canonical path.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one folder. The returned `current_path` is authoritative and
    /// may differ from the requested path.
    async fn list(&self, path: &str) -> Result<Listing, StoreError>;

    /// Whether this deployment offers a remote search endpoint.
    fn supports_search(&self) -> bool {
        false
    }

    /// Search for entries under `scope`. Only called when
    /// [`supports_search`](RemoteStore::supports_search) returns true.
    async fn search(&self, _query: &str, _scope: &str) -> Result<SearchHits, StoreError> {
        Err(StoreError::Unsupported("search".to_string()))
    }

    /// Rewrite the logical path of an upload. Fails with
    /// [`StoreError::Conflict`] on a name collision at the destination and
    /// [`StoreError::NotFound`] for an unknown upload id.
    async fn move_file(
        &self,
        upload_id: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<String, StoreError>;

    /// Delete a file or folder. Deleting an already-removed path is
    /// [`StoreError::NotFound`]: the same kind on every repeat, the calls
    /// distinguished only by state.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Create a folder under `parent_path`. Fails on empty names and name
    /// collisions.
    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<String, StoreError>;
}
