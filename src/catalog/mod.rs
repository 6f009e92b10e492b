//! Product catalog sources
//!
//! The built-in catalog is compiled into the binary. A remote catalog speaks
//! the same [`CatalogSource`] contract over HTTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::compare::ProductLookup;
use crate::models::{CategoryInfo, Product, ProductCategory};

pub mod feed;
pub mod remote;

pub use feed::{RequestSequence, Ticket};
pub use remote::{RemoteCatalog, RemoteConfig};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Coarse failure class of a catalog fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchErrorCode {
    Timeout,
    ApiError,
    NetworkError,
    DecodeError,
    NotFound,
    UnknownError,
}

impl std::fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorCode::Timeout => write!(f, "TIMEOUT"),
            FetchErrorCode::ApiError => write!(f, "API_ERROR"),
            FetchErrorCode::NetworkError => write!(f, "NETWORK_ERROR"),
            FetchErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
            FetchErrorCode::NotFound => write!(f, "NOT_FOUND"),
            FetchErrorCode::UnknownError => write!(f, "UNKNOWN_ERROR"),
        }
    }
}

/// Typed catalog fetch failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub message: String,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(code: FetchErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: FetchErrorCode::ApiError,
            message: message.into(),
            status: Some(status),
        }
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Slice `items` to this page; page 0 is treated as page 1
    fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = self.page.max(1).saturating_sub(1).saturating_mul(self.page_size);
        items
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect()
    }
}

/// One page of listing or search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub query: String,
}

/// Source of catalog data, local or remote
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn categories(&self) -> Result<Vec<ProductCategory>, FetchError>;

    async fn list_by_category(
        &self,
        category: ProductCategory,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError>;

    async fn search(
        &self,
        query: &str,
        category: Option<ProductCategory>,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Arc<Product>>, FetchError>;

    /// Resolve ids in order, dropping the ones that do not exist
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Product>>, FetchError>;

    async fn popular(
        &self,
        limit: usize,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Arc<Product>>, FetchError>;
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Arc<Product>>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(Arc::new).collect(),
        }
    }

    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Failed to parse built-in catalog")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Ok(Self::new(products))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Product>> {
        self.products.iter().find(|p| p.id == id).cloned()
    }

    /// Products of `category`, most popular first
    pub fn by_category(&self, category: ProductCategory) -> Vec<Arc<Product>> {
        let mut products: Vec<_> = self
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        products
    }

    pub fn matching(&self, query: &str, category: Option<ProductCategory>) -> Vec<Arc<Product>> {
        self.products
            .iter()
            .filter(|p| p.matches_query(query))
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect()
    }

    pub fn most_popular(&self, limit: usize, category: Option<ProductCategory>) -> Vec<Arc<Product>> {
        let mut products: Vec<_> = self
            .products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        products.truncate(limit);
        products
    }

    fn page(products: &[Arc<Product>], page: PageRequest, query: String) -> SearchPage {
        SearchPage {
            products: page.slice(products).into_iter().map(|p| (*p).clone()).collect(),
            total: products.len(),
            page: page.page.max(1),
            page_size: page.page_size,
            query,
        }
    }
}

impl ProductLookup for Catalog {
    fn lookup(&self, id: &str) -> Option<Arc<Product>> {
        self.get(id)
    }
}

#[async_trait]
impl CatalogSource for Catalog {
    async fn categories(&self) -> Result<Vec<ProductCategory>, FetchError> {
        Ok(ProductCategory::ALL.to_vec())
    }

    async fn list_by_category(
        &self,
        category: ProductCategory,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError> {
        Ok(Self::page(&self.by_category(category), page, category.to_string()))
    }

    async fn search(
        &self,
        query: &str,
        category: Option<ProductCategory>,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError> {
        Ok(Self::page(&self.matching(query, category), page, query.to_string()))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Arc<Product>>, FetchError> {
        Ok(self.get(id))
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Product>>, FetchError> {
        Ok(ids.iter().filter_map(|id| self.get(id)).collect())
    }

    async fn popular(
        &self,
        limit: usize,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Arc<Product>>, FetchError> {
        Ok(self.most_popular(limit, category))
    }
}

/// All category descriptions, in display order
pub fn category_infos() -> Vec<CategoryInfo> {
    ProductCategory::ALL.iter().map(|c| c.info()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.get("iphone-15-pro").is_some());
    }

    #[test]
    fn test_by_category_sorted_by_popularity() {
        let catalog = Catalog::builtin().unwrap();
        let phones = catalog.by_category(ProductCategory::Smartphone);

        assert!(phones.len() >= 2);
        assert!(phones.windows(2).all(|w| w[0].popularity >= w[1].popularity));
        assert!(phones.iter().all(|p| p.category == ProductCategory::Smartphone));
    }

    #[test]
    fn test_page_slicing() {
        let items: Vec<u32> = (1..=5).collect();
        assert_eq!(PageRequest::new(1, 2).slice(&items), vec![1, 2]);
        assert_eq!(PageRequest::new(3, 2).slice(&items), vec![5]);
        assert!(PageRequest::new(4, 2).slice(&items).is_empty());
        assert_eq!(PageRequest::new(0, 2).slice(&items), vec![1, 2]);
    }

    #[test]
    fn test_most_popular_truncates() {
        let catalog = Catalog::builtin().unwrap();
        let top = catalog.most_popular(3, None);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].id, "iphone-15-pro");
    }

    #[test]
    fn test_fetch_error_display_carries_code() {
        let err = FetchError::api(503, "HTTP 503: Service Unavailable");
        assert_eq!(err.to_string(), "API_ERROR: HTTP 503: Service Unavailable");
        assert_eq!(err.status, Some(503));
    }
}
