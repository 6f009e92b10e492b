//! Product browsing state
//!
//! Ties together the active category, the search box, the selection and the
//! comparison view. Listing results arrive asynchronously; each request is
//! tagged with a [`Ticket`] and applied only if nothing newer was issued and
//! the view still targets what was asked for.

use std::sync::Arc;

use crate::catalog::{CatalogSource, FetchError, PageRequest, RequestSequence, SearchPage, Ticket};
use crate::compare::ComparisonResult;
use crate::models::{Product, ProductCategory};
use crate::selection::{AddOutcome, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Categories,
    Search,
    Compare,
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewMode::Categories => write!(f, "categories"),
            ViewMode::Search => write!(f, "search"),
            ViewMode::Compare => write!(f, "compare"),
        }
    }
}

/// What a listing request was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingTarget {
    Category(ProductCategory),
    Query(String),
}

#[derive(Debug)]
pub struct Browser {
    category: ProductCategory,
    query: String,
    mode: ViewMode,
    selection: Selection,
    sequence: RequestSequence,
    listing: Option<SearchPage>,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new(Selection::default())
    }
}

impl Browser {
    pub fn new(selection: Selection) -> Self {
        Self {
            category: ProductCategory::Smartphone,
            query: String::new(),
            mode: ViewMode::Categories,
            selection,
            sequence: RequestSequence::new(),
            listing: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Selection::new(capacity))
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Last applied listing, if any
    pub fn listing(&self) -> Option<&SearchPage> {
        self.listing.as_ref()
    }

    pub fn select_category(&mut self, category: ProductCategory) {
        self.category = category;
        self.query.clear();
        self.mode = ViewMode::Categories;
    }

    /// Blank queries fall back to the category listing
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.mode = if query.trim().is_empty() {
            ViewMode::Categories
        } else {
            ViewMode::Search
        };
    }

    /// What the listing pane should currently show
    pub fn target(&self) -> ListingTarget {
        if self.mode == ViewMode::Search {
            ListingTarget::Query(self.query.trim().to_string())
        } else {
            ListingTarget::Category(self.category)
        }
    }

    /// Issue a ticket for a listing request against the current target
    pub fn begin_request(&mut self) -> (Ticket, ListingTarget) {
        (self.sequence.issue(), self.target())
    }

    /// Apply a listing result. Returns false if it was stale and discarded.
    pub fn apply_listing(&mut self, ticket: Ticket, target: &ListingTarget, page: SearchPage) -> bool {
        if !self.sequence.is_current(ticket) {
            tracing::debug!("Discarding listing for ticket {}: superseded", ticket.value());
            return false;
        }
        if *target != self.target() {
            tracing::debug!("Discarding listing for ticket {}: view moved on", ticket.value());
            return false;
        }
        self.listing = Some(page);
        true
    }

    /// Fetch and apply the listing for the current target
    pub async fn refresh(
        &mut self,
        source: &dyn CatalogSource,
        page: PageRequest,
    ) -> Result<bool, FetchError> {
        let (ticket, target) = self.begin_request();
        let result = match &target {
            ListingTarget::Category(category) => source.list_by_category(*category, page).await?,
            ListingTarget::Query(query) => source.search(query, None, page).await?,
        };
        Ok(self.apply_listing(ticket, &target, result))
    }

    pub fn add(&mut self, product: Arc<Product>) -> AddOutcome {
        self.selection.add(product)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.selection.remove(id)
    }

    pub fn can_add_more(&self) -> bool {
        !self.selection.is_full()
    }

    /// Enter comparison mode; `None` while fewer than two products are selected
    pub fn start_compare(&mut self) -> Option<ComparisonResult> {
        if !self.selection.can_compare() {
            return None;
        }
        self.mode = ViewMode::Compare;
        Some(self.selection.compare())
    }

    /// Comparison of the current selection, if in comparison mode
    pub fn comparison(&self) -> Option<ComparisonResult> {
        (self.mode == ViewMode::Compare).then(|| self.selection.compare())
    }

    /// Leave comparison mode; the selection is cleared
    pub fn exit_compare(&mut self) {
        if self.mode == ViewMode::Compare {
            self.mode = self.listing_mode();
        }
        self.selection.clear();
    }

    pub fn clear_all(&mut self) {
        self.exit_compare();
    }

    fn listing_mode(&self) -> ViewMode {
        if self.query.trim().is_empty() {
            ViewMode::Categories
        } else {
            ViewMode::Search
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn page(query: &str) -> SearchPage {
        SearchPage {
            products: Vec::new(),
            total: 0,
            page: 1,
            page_size: 20,
            query: query.to_string(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_query_switches_view_mode() {
        let mut browser = Browser::default();
        browser.set_query("apple");
        assert_eq!(browser.mode(), ViewMode::Search);
        assert_eq!(browser.target(), ListingTarget::Query("apple".to_string()));

        browser.set_query("   ");
        assert_eq!(browser.mode(), ViewMode::Categories);

        browser.set_query("apple");
        browser.select_category(ProductCategory::Laptop);
        assert_eq!(browser.query(), "");
        assert_eq!(browser.target(), ListingTarget::Category(ProductCategory::Laptop));
    }

    #[test]
    fn test_superseded_listing_is_discarded() {
        let mut browser = Browser::default();
        let (first, first_target) = browser.begin_request();
        let (second, second_target) = browser.begin_request();

        assert!(!browser.apply_listing(first, &first_target, page("old")));
        assert!(browser.apply_listing(second, &second_target, page("new")));
        assert_eq!(browser.listing().unwrap().query, "new");
    }

    #[test]
    fn test_listing_for_previous_target_is_discarded() {
        let mut browser = Browser::default();
        let (ticket, target) = browser.begin_request();
        browser.select_category(ProductCategory::Camera);

        assert!(!browser.apply_listing(ticket, &target, page("smartphone")));
        assert!(browser.listing().is_none());
    }

    #[test]
    fn test_compare_needs_two_and_exit_clears() {
        let catalog = catalog();
        let mut browser = Browser::default();
        browser.add(catalog.get("iphone-15-pro").unwrap());
        assert!(browser.start_compare().is_none());
        assert_eq!(browser.mode(), ViewMode::Categories);

        browser.add(catalog.get("galaxy-s24-ultra").unwrap());
        let result = browser.start_compare().unwrap();
        assert_eq!(result.products.len(), 2);
        assert_eq!(browser.mode(), ViewMode::Compare);

        browser.exit_compare();
        assert_eq!(browser.mode(), ViewMode::Categories);
        assert!(browser.selection().is_empty());
    }

    #[test]
    fn test_can_add_more_tracks_capacity() {
        let catalog = catalog();
        let mut browser = Browser::with_capacity(2);
        browser.add(catalog.get("iphone-15-pro").unwrap());
        assert!(browser.can_add_more());
        browser.add(catalog.get("iphone-14").unwrap());
        assert!(!browser.can_add_more());
        assert_eq!(browser.add(catalog.get("airpods-pro-2").unwrap()), AddOutcome::AtCapacity);
    }

    #[tokio::test]
    async fn test_refresh_applies_category_listing() {
        let catalog = catalog();
        let mut browser = Browser::default();
        browser.select_category(ProductCategory::Laptop);

        let applied = browser.refresh(&catalog, PageRequest::default()).await.unwrap();
        assert!(applied);
        let listing = browser.listing().unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!(listing.products[0].id, "macbook-pro-14-m3");
    }
}
