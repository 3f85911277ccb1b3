//! Records returned by a data provider.
use serde::{Deserialize, Serialize};

use crate::model::{Banner, Category, Item};

/// Full catalog payload, as returned by an initial load or a refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    pub banners: Vec<Banner>,
    pub categories: Vec<Category>,
    pub recommended_items: Vec<Item>,
}

/// One page of additional categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPage {
    pub categories: Vec<Category>,
    pub has_next_page: bool,
}
