use super::*;
use axum::http::{Method, StatusCode};
use serde_json::json;

fn fetcher_with(html: &str) -> Arc<StaticFetcher> {
    Arc::new(StaticFetcher::with_page(PRODUCT_URL, html))
}

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let app = test_app(Arc::new(StaticFetcher::default()));

    let response = make_request(&app, Method::GET, "/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "asin-watcher");
    Ok(())
}

#[tokio::test]
async fn test_scrape_records_first_observation() -> anyhow::Result<()> {
    let fetcher = fetcher_with(&product_page("1,299", "Some Gadget", "https://img.example/g.jpg"));
    let app = test_app(fetcher.clone());

    let response = make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["currentPrice"], 1299);
    assert_eq!(body["title"], "Some Gadget");
    assert_eq!(body["image"], "https://img.example/g.jpg");
    assert_eq!(body["asin"], "B0TESTASIN");

    let history = body["priceHistory"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["price"], 1299);
    assert!(history[0]["date"].is_string());
    assert_eq!(fetcher.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_scrape_appends_to_existing_history() -> anyhow::Result<()> {
    let fetcher = fetcher_with(&product_page("500", "Old Title", "old.jpg"));
    let app = test_app(fetcher.clone());

    make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;
    fetcher.set_page(PRODUCT_URL, &product_page("450", "New Title", "new.jpg"));

    let response = make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["currentPrice"], 450);
    assert_eq!(body["title"], "New Title");
    assert_eq!(body["image"], "new.jpg");

    let prices: Vec<i64> = body["priceHistory"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["price"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![500, 450]);
    Ok(())
}

#[tokio::test]
async fn test_scrape_without_asin_is_bad_request() -> anyhow::Result<()> {
    let fetcher = Arc::new(StaticFetcher::default());
    let app = test_app(fetcher.clone());

    let response = make_request(
        &app,
        Method::POST,
        "/scrape",
        scrape_body("https://www.amazon.in/gp/help/customer/display.html"),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?, json!({ "error": "ASIN not found in URL" }));
    assert_eq!(fetcher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_scrape_without_price_is_not_found() -> anyhow::Result<()> {
    let fetcher = fetcher_with("<html><span id=\"productTitle\">Sold out</span></html>");
    let app = test_app(fetcher);

    let response = make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await?, json!({ "error": "Price not found" }));

    let products = make_request(&app, Method::GET, "/products", None).await?;
    assert_eq!(body_json(products).await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_scrape_fetch_failure_is_internal_error() -> anyhow::Result<()> {
    // no page registered, so the fetch fails
    let app = test_app(Arc::new(StaticFetcher::default()));

    let response = make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await?, json!({ "error": "Something went wrong" }));
    Ok(())
}

#[tokio::test]
async fn test_scrape_rejects_malformed_bodies() -> anyhow::Result<()> {
    let app = test_app(Arc::new(StaticFetcher::default()));

    for body in [r#"{"link": "x"}"#, "not json"] {
        let response = make_request(&app, Method::POST, "/scrape", Some(body.to_string())).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(body_json(response).await?["error"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn test_scrape_with_invalid_url_reports_missing_asin() -> anyhow::Result<()> {
    let fetcher = Arc::new(StaticFetcher::default());
    let app = test_app(fetcher.clone());

    for url in ["not a url", "", "B0TESTASIN"] {
        let response = make_request(&app, Method::POST, "/scrape", scrape_body(url)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url: {url:?}");
        assert_eq!(body_json(response).await?, json!({ "error": "ASIN not found in URL" }));
    }
    assert_eq!(fetcher.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_products_listing() -> anyhow::Result<()> {
    let fetcher = fetcher_with(&product_page("999", "Gadget", "g.jpg"));
    let app = test_app(fetcher);

    let response = make_request(&app, Method::GET, "/products", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?, json!([]));

    make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;

    let response = make_request(&app, Method::GET, "/products", None).await?;
    assert_eq!(
        body_json(response).await?,
        json!([{ "asin": "B0TESTASIN", "title": "Gadget", "image": "g.jpg" }])
    );
    Ok(())
}

#[tokio::test]
async fn test_history_of_tracked_product() -> anyhow::Result<()> {
    let fetcher = fetcher_with(&product_page("120", "Gadget", "g.jpg"));
    let app = test_app(fetcher.clone());

    make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;
    fetcher.set_page(PRODUCT_URL, &product_page("90", "Gadget", "g.jpg"));
    make_request(&app, Method::POST, "/scrape", scrape_body(PRODUCT_URL)).await?;

    let response = make_request(&app, Method::GET, "/api/history/B0TESTASIN", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["currentPrice"], 90);
    assert_eq!(body["asin"], "B0TESTASIN");
    assert_eq!(body["title"], "Gadget");
    assert_eq!(body["priceHistory"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_history_of_unknown_product() -> anyhow::Result<()> {
    let app = test_app(Arc::new(StaticFetcher::default()));

    for uri in ["/api/history/B000000000", "/api/history/not-an-asin"] {
        let response = make_request(&app, Method::GET, uri, None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri: {uri}");
        assert_eq!(body_json(response).await?, json!({ "error": "Product not found" }));
    }
    Ok(())
}
