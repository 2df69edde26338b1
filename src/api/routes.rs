use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, Result},
    Json,
};
use serde::Deserialize;

use crate::api::response::ApiError;
use crate::api::SharedMonitor;
use crate::client::grid::ListingGrid;
use crate::error::Error;
use crate::model::{AddLinkData, ApiResponse, PaginateData, PriceHistory};
use crate::views;

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn index_view() -> Html<String> {
    Html(views::index_page())
}

pub async fn list_view(State(monitor): State<SharedMonitor>) -> Html<String> {
    let grid = ListingGrid::new(monitor.currency().clone());
    Html(views::list_page(&grid))
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    id: Option<String>,
}

pub async fn detail_view(
    Query(params): Query<DetailQuery>,
    State(monitor): State<SharedMonitor>,
) -> Result<Html<String>, (StatusCode, String)> {
    let raw = params.id.unwrap_or_default();
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid product id {raw:?}")))?;

    match monitor.get_product_detail(id).await {
        Ok(product) => Ok(Html(views::detail_page(&product))),
        Err(err @ Error::NotFound(_)) => Err((StatusCode::NOT_FOUND, err.to_string())),
        Err(err) => {
            tracing::error!("Failed to load product {}: {}", id, err);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()))
        }
    }
}

// The grid sends these as strings; anything unparseable counts as 0.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    draw: Option<String>,
    start: Option<String>,
    length: Option<String>,
}

fn lenient_number(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

pub async fn list_product(
    Query(params): Query<ListQuery>,
    State(monitor): State<SharedMonitor>,
) -> Result<Json<PaginateData>, ApiError> {
    let start = lenient_number(params.start.as_deref());
    let length = lenient_number(params.length.as_deref());
    let draw = params.draw.unwrap_or_default();

    let page = monitor.list_products(&draw, start, length).await.map_err(|err| {
        tracing::error!("Failed to list products: {}", err);
        ApiError::from(err)
    })?;

    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct AddLinkForm {
    #[serde(default)]
    input_link: String,
}

pub async fn add_link(
    State(monitor): State<SharedMonitor>,
    Form(form): Form<AddLinkForm>,
) -> Result<Json<ApiResponse<AddLinkData>>, ApiError> {
    match monitor.register_product(&form.input_link).await {
        Ok(id) => Ok(Json(ApiResponse::success(AddLinkData { id }))),
        Err(err) => {
            tracing::warn!("Failed to register {:?}: {}", form.input_link, err);
            Err(ApiError::internal(err.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    product_id: Option<String>,
    limit: Option<String>,
}

pub async fn list_histories(
    Query(params): Query<HistoryQuery>,
    State(monitor): State<SharedMonitor>,
) -> Result<Json<Vec<PriceHistory>>, ApiError> {
    let raw = params.product_id.unwrap_or_default();
    let product_id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid product_id {raw:?}")))?;
    let limit = params
        .limit
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let histories = monitor.list_price_history(product_id, limit).await.map_err(|err| {
        tracing::error!("Failed to get history for {}: {}", product_id, err);
        ApiError::from(err)
    })?;

    Ok(Json(histories))
}
