//! Catalog feed: flattens a category catalog into sections and rows and diffs
//! successive render states for an animated list view.

pub mod config;
pub mod diff;
pub mod feed;
pub mod flatten;
pub mod model;
pub mod pagination;
pub mod provider;
pub mod section;
pub mod snapshot;
pub mod store;

pub use diff::{apply, diff, SnapshotDiff};
pub use feed::{CatalogFeed, FeedError, PageOutcome, Update};
pub use flatten::flatten;
pub use snapshot::{IndexPath, Snapshot};
pub use store::CatalogStore;
