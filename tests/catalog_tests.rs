// Integration tests for catalog sources and stale-result handling

use anyhow::Result;
use duplex::browse::Browser;
use duplex::catalog::{
    Catalog, CatalogSource, FetchErrorCode, PageRequest, RemoteCatalog, RemoteConfig,
};
use duplex::models::ProductCategory;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One-shot-per-connection HTTP responder on a free local port.
///
/// `route` gets the request path without its query string and returns the
/// status and JSON body. Returns the base URL to point a client at.
async fn serve<F>(route: F) -> Result<String>
where
    F: Fn(&str) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }

            let request = String::from_utf8_lossy(&request);
            let target = request.split_whitespace().nth(1).unwrap_or("/");
            let path = target.split('?').next().unwrap_or(target);
            let (status, body) = route(path);
            let response = format!(
                "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    Ok(format!("http://{}", addr))
}

fn local_remote(base_url: String) -> Result<RemoteCatalog> {
    Ok(RemoteCatalog::new(RemoteConfig {
        base_url,
        api_key: None,
        timeout: Duration::from_secs(5),
        retry_attempts: 1,
        backoff: Duration::from_millis(10),
    })?)
}

async fn product_json(id: &str) -> Result<serde_json::Value> {
    let product = Catalog::builtin()?
        .get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("missing builtin product {}", id))?;
    Ok(serde_json::to_value(product.as_ref())?)
}

#[tokio::test]
async fn test_listing_pages_past_the_end_are_empty() -> Result<()> {
    let catalog = Catalog::builtin()?;

    let first = catalog
        .list_by_category(ProductCategory::Smartphone, PageRequest::new(1, 2))
        .await?;
    assert_eq!(first.total, 3);
    assert_eq!(first.products.len(), 2);
    assert!(first.products[0].popularity >= first.products[1].popularity);

    let beyond = catalog
        .list_by_category(ProductCategory::Smartphone, PageRequest::new(5, 2))
        .await?;
    assert!(beyond.products.is_empty());
    assert_eq!(beyond.total, 3);

    let zero = catalog
        .list_by_category(ProductCategory::Smartphone, PageRequest::new(0, 2))
        .await?;
    assert_eq!(zero.page, 1);
    assert_eq!(zero.products[0].id, first.products[0].id);
    Ok(())
}

#[tokio::test]
async fn test_search_with_category_filter() -> Result<()> {
    let catalog = Catalog::builtin()?;

    let apple = catalog.search("APPLE", None, PageRequest::default()).await?;
    assert!(apple.total >= 4);
    assert!(apple.products.iter().all(|p| p.brand == "Apple"
        || p.name.to_lowercase().contains("apple")
        || p.description.to_lowercase().contains("apple")));

    let laptops = catalog
        .search("apple", Some(ProductCategory::Laptop), PageRequest::default())
        .await?;
    assert!(laptops.products.iter().all(|p| p.category == ProductCategory::Laptop));
    Ok(())
}

#[tokio::test]
async fn test_get_many_keeps_order_and_drops_unknown() -> Result<()> {
    let catalog = Catalog::builtin()?;
    let ids = vec![
        "airpods-pro-2".to_string(),
        "ghost".to_string(),
        "iphone-14".to_string(),
    ];

    let products = catalog.get_many(&ids).await?;
    let found: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(found, vec!["airpods-pro-2", "iphone-14"]);
    assert!(catalog.get_by_id("ghost").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_popular_is_sorted_and_limited() -> Result<()> {
    let catalog = Catalog::builtin()?;
    let top = catalog.popular(3, None).await?;

    assert_eq!(top.len(), 3);
    assert_eq!(top[0].id, "iphone-15-pro");
    assert!(top.windows(2).all(|w| w[0].popularity >= w[1].popularity));
    Ok(())
}

#[tokio::test]
async fn test_slow_result_for_old_category_is_discarded() -> Result<()> {
    let catalog = Catalog::builtin()?;
    let mut browser = Browser::default();

    browser.select_category(ProductCategory::Smartphone);
    let (slow_ticket, slow_target) = browser.begin_request();
    let slow = catalog
        .list_by_category(ProductCategory::Smartphone, PageRequest::default())
        .await?;

    browser.select_category(ProductCategory::Laptop);
    assert!(browser.refresh(&catalog, PageRequest::default()).await?);

    assert!(!browser.apply_listing(slow_ticket, &slow_target, slow));
    assert_eq!(browser.listing().unwrap().query, "laptop");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_remote_reports_network_error() -> Result<()> {
    let remote = RemoteCatalog::new(RemoteConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: None,
        timeout: Duration::from_secs(2),
        retry_attempts: 2,
        backoff: Duration::from_millis(10),
    })?;

    let err = remote.get_by_id("iphone-15-pro").await.unwrap_err();
    assert!(matches!(
        err.code,
        FetchErrorCode::NetworkError | FetchErrorCode::Timeout
    ));
    assert!(err.to_string().starts_with(&err.code.to_string()));
    Ok(())
}

#[tokio::test]
async fn test_remote_unwraps_data_envelope_and_maps_404_to_none() -> Result<()> {
    let iphone = product_json("iphone-15-pro").await?;
    let base = serve(move |path| match path {
        "/products/iphone-15-pro" => (200, serde_json::json!({ "data": iphone }).to_string()),
        "/products/bare" => (200, iphone.to_string()),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    })
    .await?;
    let remote = local_remote(base)?;

    let found = remote.get_by_id("iphone-15-pro").await?.unwrap();
    assert_eq!(found.id, "iphone-15-pro");
    assert_eq!(found.category, ProductCategory::Smartphone);

    assert!(remote.get_by_id("ghost").await?.is_none());

    // A body without the envelope is a decode failure, not a missing product
    let err = remote.get_by_id("bare").await.unwrap_err();
    assert_eq!(err.code, FetchErrorCode::DecodeError);
    Ok(())
}

#[tokio::test]
async fn test_remote_batch_is_returned_in_request_order() -> Result<()> {
    let batch = serde_json::json!({
        "data": [product_json("iphone-14").await?, product_json("iphone-15-pro").await?]
    })
    .to_string();
    let base = serve(move |path| match path {
        "/products/batch" => (200, batch.clone()),
        _ => (404, "{}".to_string()),
    })
    .await?;
    let remote = local_remote(base)?;

    let ids = vec![
        "iphone-15-pro".to_string(),
        "ghost".to_string(),
        "iphone-14".to_string(),
    ];
    let products = remote.get_many(&ids).await?;
    let got: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(got, vec!["iphone-15-pro", "iphone-14"]);
    Ok(())
}

#[tokio::test]
async fn test_remote_id_with_slash_stays_one_path_segment() -> Result<()> {
    let iphone = product_json("iphone-15-pro").await?;
    let base = serve(move |path| match path {
        "/products/a%2Fb" => (200, serde_json::json!({ "data": iphone }).to_string()),
        _ => (404, "{}".to_string()),
    })
    .await?;
    let remote = local_remote(base)?;

    assert!(remote.get_by_id("a/b").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_remote_server_error_is_an_api_error() -> Result<()> {
    let base = serve(|_| (500, "{}".to_string())).await?;
    let remote = local_remote(base)?;

    let err = remote.get_by_id("iphone-15-pro").await.unwrap_err();
    assert_eq!(err.status, Some(500));
    Ok(())
}
