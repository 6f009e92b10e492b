//! HTTP catalog client
//!
//! Every endpoint answers with a `{ "data": ... }` envelope. Transient
//! failures are retried with linear backoff before being surfaced.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{CatalogSource, FetchError, FetchErrorCode, PageRequest, SearchPage};
use crate::models::{Product, ProductCategory};

/// Remote catalog configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Total attempts per request, including the first
    pub retry_attempts: u32,
    /// Delay unit; attempt `n` waits `backoff * n` before the next try
    pub backoff: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.zol.com.cn".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            retry_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

impl FetchError {
    /// Worth another attempt
    pub fn is_transient(&self) -> bool {
        match self.code {
            FetchErrorCode::Timeout | FetchErrorCode::NetworkError | FetchErrorCode::UnknownError => {
                true
            }
            FetchErrorCode::ApiError => {
                matches!(self.status, Some(s) if s >= 500 || s == 429)
            }
            FetchErrorCode::DecodeError | FetchErrorCode::NotFound => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            FetchErrorCode::Timeout
        } else if err.is_decode() {
            FetchErrorCode::DecodeError
        } else if err.is_connect() || err.is_request() {
            FetchErrorCode::NetworkError
        } else {
            FetchErrorCode::UnknownError
        };
        let message = match code {
            FetchErrorCode::Timeout => "Request timed out, check the network connection".to_string(),
            _ => err.to_string(),
        };
        FetchError {
            code,
            message,
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Run `op` up to `attempts` times, sleeping `backoff * attempt` between
/// transient failures. Attempts are numbered from 1.
pub async fn with_retry<T, F, Fut>(attempts: u32, backoff: Duration, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && err.is_transient() => {
                tracing::warn!("Catalog request attempt {} failed: {}", attempt, err);
                tokio::time::sleep(retry_delay(backoff, attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Delay after failed attempt `attempt`; saturates instead of overflowing
fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
}

/// Catalog served over HTTP
pub struct RemoteCatalog {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteCatalog {
    pub fn new(config: RemoteConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Base URL extended by `segments`, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base).map_err(|e| {
            FetchError::new(
                FetchErrorCode::UnknownError,
                format!("Invalid base URL {}: {}", base, e),
            )
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::new(
                    FetchErrorCode::UnknownError,
                    format!("Base URL cannot take a path: {}", base),
                )
            })?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        with_retry(self.config.retry_attempts, self.config.backoff, |_| {
            self.send_once(&url, params)
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url.clone()).query(params);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError {
                code: FetchErrorCode::NotFound,
                message: format!("Not found: {}", url),
                status: Some(status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::api(
                status.as_u16(),
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown status")
                ),
            ));
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

/// The batch endpoint may reorder or omit; put results back in `ids` order
fn in_request_order(ids: &[String], products: Vec<Product>) -> Vec<Arc<Product>> {
    let products: Vec<Arc<Product>> = products.into_iter().map(Arc::new).collect();
    ids.iter()
        .filter_map(|id| products.iter().find(|p| &p.id == id).cloned())
        .collect()
}

fn page_params(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.page.max(1).to_string()),
        ("pageSize", page.page_size.to_string()),
    ]
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    async fn categories(&self) -> Result<Vec<ProductCategory>, FetchError> {
        self.get(&["categories"], &[]).await
    }

    async fn list_by_category(
        &self,
        category: ProductCategory,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError> {
        let category = category.to_string();
        self.get(&["products", "category", &category], &page_params(page))
            .await
    }

    async fn search(
        &self,
        query: &str,
        category: Option<ProductCategory>,
        page: PageRequest,
    ) -> Result<SearchPage, FetchError> {
        let mut params = vec![("q", query.to_string())];
        params.extend(page_params(page));
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        self.get(&["products", "search"], &params).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Arc<Product>>, FetchError> {
        match self.get::<Product>(&["products", id], &[]).await {
            Ok(product) => Ok(Some(Arc::new(product))),
            Err(err) if err.code == FetchErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Product>>, FetchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let products: Vec<Product> = self
            .get(&["products", "batch"], &[("ids", ids.join(","))])
            .await?;
        Ok(in_request_order(ids, products))
    }

    async fn popular(
        &self,
        limit: usize,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Arc<Product>>, FetchError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        let products: Vec<Product> = self.get(&["products", "trending"], &params).await?;
        Ok(products.into_iter().map(Arc::new).collect())
    }
}
