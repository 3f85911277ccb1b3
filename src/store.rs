//! Authoritative catalog data plus the declared section order.
//!
//! Nothing here fails or performs I/O; callers hand in trusted, in-process data.
use tracing::debug;

use crate::flatten::flatten;
use crate::model::{Banner, Category, Item};
use crate::section::SectionDescriptor;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    banners: Vec<Banner>,
    categories: Vec<Category>,
    recommended_items: Vec<Item>,
    descriptors: Vec<SectionDescriptor>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn recommended_items(&self) -> &[Item] {
        &self.recommended_items
    }

    pub fn section_descriptors(&self) -> &[SectionDescriptor] {
        &self.descriptors
    }

    /// Full replace of the data. The section order is left alone.
    pub fn set_all(&mut self, banners: Vec<Banner>, categories: Vec<Category>, recommended_items: Vec<Item>) {
        self.banners = banners;
        self.categories = categories;
        self.recommended_items = recommended_items;
    }

    /// Replace the categories. Category slots are rewritten in the new order while
    /// every non-category descriptor stays at its index (clamped to the new length).
    pub fn replace_categories(&mut self, categories: Vec<Category>) {
        let fixed: Vec<(usize, SectionDescriptor)> = self
            .descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.category().is_none())
            .map(|(i, d)| (i, d.clone()))
            .collect();

        let mut descriptors: Vec<SectionDescriptor> = categories
            .iter()
            .cloned()
            .map(SectionDescriptor::Category)
            .collect();
        for (index, descriptor) in fixed {
            let at = index.min(descriptors.len());
            descriptors.insert(at, descriptor);
        }

        self.categories = categories;
        self.descriptors = descriptors;
    }

    /// Append categories whose name is not already present, returning the ones
    /// that were added. Names are the dedup key, so two distinct categories that
    /// share a display name collapse into the first one.
    pub fn append_categories(&mut self, categories: Vec<Category>) -> Vec<Category> {
        let mut appended = Vec::new();
        for category in categories {
            if self.categories.iter().any(|c| c.name == category.name) {
                debug!(name = %category.name, "skipping category with duplicate name");
                continue;
            }
            self.categories.push(category.clone());
            appended.push(category);
        }
        appended
    }

    pub fn set_section_descriptors(&mut self, descriptors: Vec<SectionDescriptor>) {
        self.descriptors = descriptors;
    }

    /// Rebuild the section order for `categories`.
    ///
    /// The banner slot always leads. Existing category slots keep their order,
    /// matched by name and refreshed with the new content; names no longer present
    /// are dropped and unseen names are appended. Recommendations go back to where
    /// they were (staying last if they were last), otherwise to
    /// `recommendation_index` when it is in range, otherwise to the end.
    pub fn reconcile_descriptors(&mut self, categories: &[Category], recommendation_index: Option<usize>) {
        let previous_recommendations = self
            .descriptors
            .iter()
            .position(SectionDescriptor::is_recommendations)
            .map(|pos| (pos, pos + 1 == self.descriptors.len()));

        let mut descriptors = vec![SectionDescriptor::Banner];
        let mut placed = vec![false; categories.len()];
        for existing in self.descriptors.iter().filter_map(SectionDescriptor::category) {
            let found = categories
                .iter()
                .enumerate()
                .find(|(i, c)| !placed[*i] && c.name == existing.name);
            if let Some((i, category)) = found {
                placed[i] = true;
                descriptors.push(SectionDescriptor::Category(category.clone()));
            }
        }
        for (category, _) in categories.iter().zip(&placed).filter(|(_, p)| !**p) {
            descriptors.push(SectionDescriptor::Category(category.clone()));
        }

        let at = match (previous_recommendations, recommendation_index) {
            (Some((_, true)), _) => descriptors.len(),
            (Some((pos, false)), _) => pos.min(descriptors.len()),
            (None, Some(index)) if index <= descriptors.len() => index,
            (None, _) => descriptors.len(),
        };
        descriptors.insert(at, SectionDescriptor::Recommendations);

        self.descriptors = descriptors;
    }

    /// Move the recommendations slot to `index` (clamped), adding it if absent.
    pub fn move_recommendations(&mut self, index: usize) {
        self.descriptors.retain(|d| !d.is_recommendations());
        let at = index.min(self.descriptors.len());
        self.descriptors.insert(at, SectionDescriptor::Recommendations);
    }

    pub fn snapshot(&self) -> Snapshot {
        flatten(
            &self.descriptors,
            &self.banners,
            &self.categories,
            &self.recommended_items,
        )
    }
}
