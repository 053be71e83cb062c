use super::*;
use asin_watcher::store::SqliteHistoryStore;
use asin_watcher::Asin;
use axum::http::{Method, StatusCode};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn sqlite_store(config: &AppConfig) -> anyhow::Result<Arc<dyn HistoryStore>> {
    Ok(Arc::new(SqliteHistoryStore::connect(&config.database).await?))
}

#[tokio::test]
async fn test_short_link_is_resolved_before_tracking() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let canonical = format!("{}/Gadget/dp/B0SHORTLNK", server.uri());

    Mock::given(method("GET"))
        .and(path("/d/xyz"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", canonical.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Gadget/dp/B0SHORTLNK"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("2,499", "Linked Gadget", "l.jpg")),
        )
        .mount(&server)
        .await;

    let config = get_test_config();
    let store = sqlite_store(&config).await?;
    let app = create_router(create_http_app_state(config, store)?);

    let short_link = format!("{}/d/xyz", server.uri());
    let response = make_request(&app, Method::POST, "/scrape", scrape_body(&short_link)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["asin"], "B0SHORTLNK");
    assert_eq!(body["currentPrice"], 2499);
    assert_eq!(body["title"], "Linked Gadget");
    Ok(())
}

#[tokio::test]
async fn test_failed_resolution_falls_back_to_original_url() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = get_test_config();
    let store = sqlite_store(&config).await?;
    let app = create_router(create_http_app_state(config, store)?);

    // the unresolved short link carries no ASIN
    let short_link = format!("{}/d/broken", server.uri());
    let response = make_request(&app, Method::POST, "/scrape", scrape_body(&short_link)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["error"], "ASIN not found in URL");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_scrapes_keep_every_observation() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B0CONCURRT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("700", "Busy", "b.jpg")))
        .mount(&server)
        .await;

    let mut config = get_test_config();
    config.scraper.short_link_hosts = vec!["amzn.in".to_string()];
    let store = sqlite_store(&config).await?;
    let app = create_router(create_http_app_state(config, Arc::clone(&store))?);

    let url = format!("{}/dp/B0CONCURRT", server.uri());
    let requests = (0..8).map(|_| make_request(&app, Method::POST, "/scrape", scrape_body(&url)));
    for response in futures::future::join_all(requests).await {
        assert_eq!(response?.status(), StatusCode::OK);
    }

    let asin: Asin = "B0CONCURRT".parse()?;
    let record = store.find_product(&asin).await?.expect("product stored");
    assert_eq!(record.price_history.len(), 8);

    let response = make_request(&app, Method::GET, "/products", None).await?;
    assert_eq!(body_json(response).await?.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_slow_upstream_past_server_timeout_is_internal_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/B0SLOWPAGE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("300", "Slow", "s.jpg"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = get_test_config();
    config.server.request_timeout = 1;
    config.scraper.short_link_hosts = vec!["amzn.in".to_string()];
    let store = sqlite_store(&config).await?;
    let app = create_router(create_http_app_state(config, store)?);

    let url = format!("{}/dp/B0SLOWPAGE", server.uri());
    let response = make_request(&app, Method::POST, "/scrape", scrape_body(&url)).await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await?["error"], "Something went wrong");
    Ok(())
}
