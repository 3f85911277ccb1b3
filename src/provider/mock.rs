//! In-process stand-in for the catalog API.
//!
//! Every call mints fresh ids, like the demo backend did, so refreshed content
//! always arrives as new rows.
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CatalogData, CategoryPage, DataProvider, FetchError};
use crate::config::{Config, Mock};
use crate::model::{Banner, Category, Color, Item, SubCategory};

const CATEGORY_NAMES: &[&str] = &[
    "Fruit", "Sports", "Pets", "Books", "Music", "Garden", "Kitchen", "Travel", "Games", "Tools",
];

const SUBCATEGORY_NAMES: &[&str] = &["Popular", "New arrivals", "Classics", "On sale", "Staff picks"];

const BANNERS: &[(&str, &str)] = &[
    ("Summer sale", "banner_summer"),
    ("Free delivery", "banner_delivery"),
    ("New season", "banner_season"),
    ("Gift ideas", "banner_gifts"),
];

#[derive(Debug)]
pub struct MockDataProvider {
    settings: Mock,
    page_size: usize,
    refreshes: AtomicU32,
    failures_left: AtomicUsize,
}

impl MockDataProvider {
    pub fn new(settings: Mock, page_size: usize) -> Self {
        Self {
            settings,
            page_size,
            refreshes: AtomicU32::new(0),
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.mock.clone(), cfg.feed.page_size)
    }

    /// Make the next `n` calls fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Highest page number that still carries categories.
    pub fn last_page(&self) -> u32 {
        1 + self.settings.total_pages
    }

    async fn simulate(&self, call: &'static str) -> Result<(), FetchError> {
        if self.settings.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.latency_ms)).await;
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            warn!(call, "mock provider failing on request");
            return Err(FetchError::Failed(format!("{call}: simulated network error")));
        }
        Ok(())
    }

    fn catalog(&self, variant: u32) -> CatalogData {
        let banners = (0..self.settings.banners)
            .map(|i| {
                let (title, image) = BANNERS[(i + variant as usize) % BANNERS.len()];
                Banner::new(title, image, Color::cycle(i + variant as usize))
            })
            .collect();
        let recommended_items = (0..self.settings.recommended_items)
            .map(|i| Item::new(format!("Recommended #{}", i + 1), Color::cycle(i * 3 + variant as usize)))
            .collect();
        CatalogData {
            banners,
            categories: self.categories_at(0, self.page_size),
            recommended_items,
        }
    }

    fn categories_at(&self, offset: usize, count: usize) -> Vec<Category> {
        (offset..offset + count).map(|i| self.category(i)).collect()
    }

    fn category(&self, index: usize) -> Category {
        let base = CATEGORY_NAMES[index % CATEGORY_NAMES.len()];
        let name = match index / CATEGORY_NAMES.len() {
            0 => base.to_string(),
            round => format!("{base} {}", round + 1),
        };
        let subs = (0..self.settings.subcategories_per_category)
            .map(|s| {
                let sub_name = SUBCATEGORY_NAMES[s % SUBCATEGORY_NAMES.len()];
                let items = (0..self.settings.items_per_subcategory)
                    .map(|n| Item::new(format!("{name} {sub_name} {}", n + 1), Color::cycle(index + s + n)))
                    .collect();
                SubCategory::new(sub_name, items)
            })
            .collect();
        Category::new(name, subs)
    }
}

#[async_trait]
impl DataProvider for MockDataProvider {
    async fn fetch_all(&self) -> Result<CatalogData, FetchError> {
        self.simulate("fetch_all").await?;
        self.refreshes.store(0, Ordering::SeqCst);
        Ok(self.catalog(0))
    }

    async fn fetch_updated(&self) -> Result<CatalogData, FetchError> {
        self.simulate("fetch_updated").await?;
        let variant = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(variant, "serving refreshed catalog");
        Ok(self.catalog(variant))
    }

    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<CategoryPage, FetchError> {
        self.simulate("fetch_page").await?;
        if page < 2 || page > self.last_page() {
            return Ok(CategoryPage::default());
        }
        let offset = (page as usize - 1) * page_size;
        Ok(CategoryPage {
            categories: self.categories_at(offset, page_size),
            has_next_page: page < self.last_page(),
        })
    }
}
