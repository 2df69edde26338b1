use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product as scraped from its page, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPayload {
    pub name: String,
    pub current_price: i64,
    pub original_price: i64,
    pub url: String,
    pub images: Vec<String>,
}

/// A stored product row with its active images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub current_price: i64,
    pub original_price: i64,
    pub url: String,
    pub images: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Product detail as handed to the detail view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub current_price: i64,
    pub current_price_string: String,
    pub original_price: i64,
    pub original_price_string: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistory {
    pub id: i64,
    pub product_id: i64,
    pub current_price: i64,
    pub original_price: i64,
    pub update_time: DateTime<Utc>,
}

/// One row of the listing grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRow {
    pub id: i64,
    pub name: String,
    pub current_price: i64,
    pub original_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Server-side pagination envelope understood by the grid widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginateData {
    pub draw: String,
    #[serde(rename = "recordsTotal")]
    pub records_total: i64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: i64,
    #[serde(rename = "data")]
    pub products: Vec<ListingRow>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddLinkData {
    pub id: i64,
}

/// `{status, data, error}` envelope used by the form endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Some("Success".to_string()),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: None,
            data: None,
            error: Some(error.into()),
        }
    }
}
