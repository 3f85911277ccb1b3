//! Section and row keys shared by flattening and diffing.
use serde::{Deserialize, Serialize};

use crate::model::{Banner, BannerId, Category, CategoryId, Item, ItemId, SubCategory, SubCategoryId};

/// What kind of section occupies a position, regardless of whether data for it
/// currently exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SectionDescriptor {
    Banner,
    Category(Category),
    Recommendations,
}

impl SectionDescriptor {
    pub fn section(&self) -> Section {
        match self {
            SectionDescriptor::Banner => Section::Banner,
            SectionDescriptor::Category(c) => Section::Category(c.id),
            SectionDescriptor::Recommendations => Section::Recommendations,
        }
    }

    pub fn category(&self) -> Option<&Category> {
        match self {
            SectionDescriptor::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_recommendations(&self) -> bool {
        matches!(self, SectionDescriptor::Recommendations)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionDescriptor::Banner => "banner",
            SectionDescriptor::Category(_) => "category",
            SectionDescriptor::Recommendations => "recommendations",
        }
    }
}

/// Rendering key of a section. A category section is keyed by the category id,
/// so editing a category's content in place keeps its section identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Section {
    Banner,
    Category(CategoryId),
    Recommendations,
}

/// One cell payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Row {
    SubCategoryHeader(SubCategory),
    LeafItem {
        item: Item,
        parent: Option<SubCategoryId>,
    },
    BannerCell(Banner),
}

/// Identity of a row. Leaf rows include their parent so the same item under two
/// subcategories yields two distinct rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RowId {
    Header(SubCategoryId),
    Leaf {
        item: ItemId,
        parent: Option<SubCategoryId>,
    },
    Banner(BannerId),
}

impl Row {
    pub fn header(sub: &SubCategory) -> Self {
        Row::SubCategoryHeader(sub.clone())
    }

    pub fn leaf(item: &Item, parent: Option<SubCategoryId>) -> Self {
        Row::LeafItem {
            item: item.clone(),
            parent,
        }
    }

    pub fn banner(banner: &Banner) -> Self {
        Row::BannerCell(banner.clone())
    }

    pub fn id(&self) -> RowId {
        match self {
            Row::SubCategoryHeader(sub) => RowId::Header(sub.id),
            Row::LeafItem { item, parent } => RowId::Leaf {
                item: item.id,
                parent: *parent,
            },
            Row::BannerCell(b) => RowId::Banner(b.id),
        }
    }

    /// Text a cell would show.
    pub fn title(&self) -> &str {
        match self {
            Row::SubCategoryHeader(sub) => &sub.name,
            Row::LeafItem { item, .. } => &item.title,
            Row::BannerCell(b) => &b.title,
        }
    }
}
