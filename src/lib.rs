// ShareNav - navigation and curation engine for remote file shares
//
// Two independent navigation contexts (main view + destination picker),
// a listing cache, a debounced search pipeline with a local fallback and
// a path-rewrite workflow, all speaking to an opaque remote store.

pub mod cache;
pub mod config;
pub mod navigation;
pub mod path;
pub mod relocate;
pub mod search;
pub mod store;

pub use cache::TreeCache;
pub use config::ClientConfig;
pub use navigation::{Navigated, NavigationContext, Selection};
pub use relocate::RelocateWorkflow;
pub use search::{Provenance, SearchController, SearchMode, SearchResults};
pub use store::{Entry, HttpStore, Listing, RemoteStore, SearchHits, StoreError};
