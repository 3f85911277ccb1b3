use async_trait::async_trait;
use thiserror::Error;

pub mod mock;
pub mod model;

pub use mock::MockDataProvider;
pub use model::{CatalogData, CategoryPage};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Failed(String),
    #[error("data source unavailable")]
    Unavailable,
}

/// Source of catalog data. These calls are the only suspension points of the
/// feed; everything downstream of them is synchronous.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_all(&self) -> Result<CatalogData, FetchError>;

    async fn fetch_updated(&self) -> Result<CatalogData, FetchError>;

    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<CategoryPage, FetchError>;
}
