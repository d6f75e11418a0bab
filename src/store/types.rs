//! Shared types for the remote share store.
//!
//! This module contains the entry and listing representations exchanged
//! with the store, plus the error taxonomy every component maps transport
//! failures into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path;

/// A folder or file as reported by the store.
///
/// Folders are derived from path structure on some deployments rather than
/// stored records, so folder existence is only ever inferred from listing
/// responses. Files carry a stable `upload_id` that survives renames and
/// moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Display label
    pub name: String,
    /// Canonical path of the entry itself
    pub path: String,
    /// Folder/file discriminator
    pub is_folder: bool,
    /// Stable identifier of the underlying upload (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    /// Size in bytes (0 for folders)
    #[serde(default)]
    pub size: u64,
    /// Upload timestamp (files only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create a folder entry.
    pub fn folder(name: impl Into<String>, entry_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path::normalize(&entry_path.into()),
            is_folder: true,
            upload_id: None,
            size: 0,
            uploaded_at: None,
        }
    }

    /// Create a file entry.
    pub fn file(
        name: impl Into<String>,
        entry_path: impl Into<String>,
        upload_id: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            path: path::normalize(&entry_path.into()),
            is_folder: false,
            upload_id: Some(upload_id.into()),
            size,
            uploaded_at: None,
        }
    }

    /// Re-normalize the entry path in place. Wire paths may arrive with
    /// leading separators; state only holds canonical form.
    fn canonicalize(&mut self) {
        self.path = path::normalize(&self.path);
    }
}

/// Result of listing one folder.
///
/// `current_path` is the server-confirmed location and is authoritative: it
/// may differ from the requested path (the store falls back to the nearest
/// valid ancestor when the requested folder no longer exists) and callers
/// must adopt it, never the path they asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub current_path: String,
    #[serde(default)]
    pub folders: Vec<Entry>,
    #[serde(default)]
    pub files: Vec<Entry>,
}

impl Listing {
    /// An empty listing at the given path.
    pub fn empty(current_path: impl Into<String>) -> Self {
        Self {
            current_path: path::normalize(&current_path.into()),
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Canonicalize every stored path. Applied once at the store boundary
    /// so engine state never sees a non-canonical path.
    pub fn canonicalized(mut self) -> Self {
        self.current_path = path::normalize(&self.current_path);
        for entry in self.folders.iter_mut().chain(self.files.iter_mut()) {
            entry.canonicalize();
        }
        self
    }

    /// Whether a file with this upload id is present.
    pub fn contains_upload(&self, upload_id: &str) -> bool {
        self.files
            .iter()
            .any(|f| f.upload_id.as_deref() == Some(upload_id))
    }
}

/// Result of a remote search: same entry shape as a listing, but not bound
/// to a single confirmed path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub folders: Vec<Entry>,
    #[serde(default)]
    pub files: Vec<Entry>,
}

impl SearchHits {
    /// Canonicalize every hit path, as [`Listing::canonicalized`] does.
    pub fn canonicalized(mut self) -> Self {
        for entry in self.folders.iter_mut().chain(self.files.iter_mut()) {
            entry.canonicalize();
        }
        self
    }
}

/// Store error taxonomy.
///
/// Transport adapters map wire failures into these kinds; engine components
/// never let a raw transport error cross their own boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Requested path or entry no longer exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// Name collision on create/move
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Session expired or missing; handled by the auth layer, not here
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network failure or server-side fault; previous state is preserved
    /// and the caller may retry
    #[error("Transient error: {0}")]
    Transient(String),

    /// Request refused by the server for a non-retriable reason
    #[error("{0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation not offered by this store
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// Bad client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}
