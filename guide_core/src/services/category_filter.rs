//! Category filter engine.
//!
//! The selection is a display filter over the catalog. An empty selection
//! means "no constraint": every site is shown.

use std::collections::BTreeSet;

use tracing::debug;

use crate::models::{Category, Site};
use crate::services::catalog::categories_of;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    selected: BTreeSet<Category>,
}

impl CategoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &BTreeSet<Category> {
        &self.selected
    }

    pub fn is_selected(&self, category: &Category) -> bool {
        self.selected.contains(category)
    }

    /// True when no category constrains the catalog.
    pub fn is_unfiltered(&self) -> bool {
        self.selected.is_empty()
    }

    /// Add `category` if absent, remove it if present.
    pub fn toggle(&mut self, category: Category) {
        if !self.selected.remove(&category) {
            self.selected.insert(category);
        }
    }

    /// Switch between "every category selected" and "no filter".
    ///
    /// If the selection already equals the full category set of `catalog`,
    /// it is cleared; otherwise it becomes that full set.
    pub fn select_all(&mut self, catalog: &[Site]) {
        let all = categories_of(catalog);
        if self.selected == all {
            self.selected.clear();
        } else {
            self.selected = all;
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Filter `catalog` by the selection.
    ///
    /// Selected categories that no longer exist in `catalog` are dropped
    /// first. If nothing is left selected, the catalog is returned whole.
    pub fn apply(&mut self, catalog: &[Site]) -> Vec<Site> {
        let available = categories_of(catalog);
        let before = self.selected.len();
        self.selected.retain(|c| available.contains(c));
        if self.selected.len() != before {
            debug!(
                dropped = before - self.selected.len(),
                "Dropped categories missing from the catalog"
            );
        }

        if self.selected.is_empty() {
            return catalog.to_vec();
        }
        catalog
            .iter()
            .filter(|site| self.selected.contains(&site.category))
            .cloned()
            .collect()
    }
}
