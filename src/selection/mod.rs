//! Bounded multi-select list backing the comparison view
//!
//! Every operation is total. Adding a product that is already selected, or
//! adding past capacity, leaves the selection untouched and reports why.

use std::sync::Arc;

use crate::compare::{self, ComparisonResult, ProductLookup};
use crate::models::Product;

pub const DEFAULT_CAPACITY: usize = 4;

/// What `Selection::add` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadySelected,
    AtCapacity,
}

/// Insertion-ordered set of products, unique by id
#[derive(Debug, Clone)]
pub struct Selection {
    items: Vec<Arc<Product>>,
    capacity: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Selection {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, product: Arc<Product>) -> AddOutcome {
        if self.contains(&product.id) {
            return AddOutcome::AlreadySelected;
        }
        if self.is_full() {
            return AddOutcome::AtCapacity;
        }
        self.items.push(product);
        AddOutcome::Added
    }

    /// Returns whether anything was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|p| p.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|p| p.id == id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Enough products to start a comparison
    pub fn can_compare(&self) -> bool {
        self.items.len() >= compare::MIN_COMPARABLE
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Product>> {
        self.items.iter()
    }

    /// Compare the selected products in selection order
    pub fn compare(&self) -> ComparisonResult {
        compare::compare_products(self.items.clone())
    }
}

impl ProductLookup for Selection {
    fn lookup(&self, id: &str) -> Option<Arc<Product>> {
        self.items.iter().find(|p| p.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductCategory;

    fn product(id: &str) -> Arc<Product> {
        Arc::new(Product::new(id, id, ProductCategory::Tablet))
    }

    #[test]
    fn test_capacity_keeps_first_items() {
        let mut selection = Selection::new(4);
        let outcomes: Vec<_> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(|id| selection.add(product(id)))
            .collect();

        assert_eq!(outcomes[4], AddOutcome::AtCapacity);
        assert_eq!(selection.ids(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_duplicate_add_is_absorbed() {
        let mut selection = Selection::default();
        selection.add(product("a"));
        assert_eq!(selection.add(product("a")), AddOutcome::AlreadySelected);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut selection = Selection::default();
        selection.add(product("a"));
        selection.add(product("b"));

        assert!(selection.remove("a"));
        assert!(!selection.remove("a"));
        assert_eq!(selection.ids(), vec!["b"]);

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_can_compare_needs_two() {
        let mut selection = Selection::default();
        selection.add(product("a"));
        assert!(!selection.can_compare());
        selection.add(product("b"));
        assert!(selection.can_compare());
    }
}
