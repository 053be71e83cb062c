use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, AppState, HealthResponse};
use crate::identity::Asin;
use crate::models::ProductSummary;
use crate::product_manager::{PriceHistoryView, TrackedPrice};
use crate::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScrapeRequest {
    #[validate(url(message = "A valid product URL is required"))]
    pub url: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `POST /scrape`: track the current price of the product behind `url`.
pub async fn scrape_product(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<TrackedPrice>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    // a value that is not a URL cannot carry an ASIN either
    if let Err(e) = request.validate() {
        tracing::debug!(url = %request.url, error = %e, "Rejecting invalid product URL");
        return Err(ApiError::from_app_error(AppError::AsinNotFound, "Something went wrong"));
    }

    tracing::info!(url = %request.url, "Tracking request received");

    state
        .product_manager
        .track_price(&request.url)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_app_error(e, "Something went wrong"))
}

/// `GET /products`
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductSummary>>, ApiError> {
    state
        .product_manager
        .list_products()
        .await
        .map(Json)
        .map_err(|e| ApiError::from_app_error(e, "Unable to fetch products"))
}

/// `GET /api/history/:asin`
pub async fn get_price_history(
    State(state): State<AppState>,
    Path(asin): Path<String>,
) -> Result<Json<PriceHistoryView>, ApiError> {
    // a malformed ASIN can never have been stored
    let Ok(asin) = asin.parse::<Asin>() else {
        tracing::debug!(asin = %asin, "Rejecting malformed ASIN");
        return Err(ApiError::not_found("Product"));
    };

    state
        .product_manager
        .get_history(&asin)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_app_error(e, "Server error"))
}
