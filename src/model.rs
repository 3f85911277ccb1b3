//! Catalog domain records.
//!
//! Every record carries an id minted once at construction. Equality and hashing
//! look at the id only, never at the content, so a record re-fetched with the
//! same id compares equal even when its title changed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(ItemId);
id_type!(SubCategoryId);
id_type!(CategoryId);
id_type!(BannerId);

/// Opaque display color. Only the view layer cares about it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Indigo,
    Purple,
    Pink,
    Gray,
}

impl Color {
    pub const PALETTE: [Color; 10] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Teal,
        Color::Blue,
        Color::Indigo,
        Color::Purple,
        Color::Pink,
        Color::Gray,
    ];

    /// Palette entry for `n`, wrapping around.
    pub fn cycle(n: usize) -> Color {
        Self::PALETTE[n % Self::PALETTE.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Teal => "teal",
            Color::Blue => "blue",
            Color::Indigo => "indigo",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Gray => "gray",
        }
    }
}

/// Leaf display unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub color: Color,
}

impl Item {
    pub fn new(title: impl Into<String>, color: Color) -> Self {
        Self {
            id: ItemId::new(),
            title: title.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub name: String,
    /// Display order.
    pub items: Vec<Item>,
}

impl SubCategory {
    pub fn new(name: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            id: SubCategoryId::new(),
            name: name.into(),
            items,
        }
    }
}

/// Top-level grouping; one category renders as exactly one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sub_categories: Vec<SubCategory>,
}

impl Category {
    pub fn new(name: impl Into<String>, sub_categories: Vec<SubCategory>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            sub_categories,
        }
    }

    pub fn item_count(&self) -> usize {
        self.sub_categories.iter().map(|s| s.items.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_name: String,
    pub background_color: Color,
}

impl Banner {
    pub fn new(title: impl Into<String>, image_name: impl Into<String>, background_color: Color) -> Self {
        Self {
            id: BannerId::new(),
            title: title.into(),
            image_name: image_name.into(),
            background_color,
        }
    }
}

macro_rules! identity_eq {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}

identity_eq!(Item);
identity_eq!(SubCategory);
identity_eq!(Category);
identity_eq!(Banner);
