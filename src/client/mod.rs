//! Typed client for the price monitor endpoints.
//!
//! Each operation corresponds to one of the page scripts: the detail chart
//! loader, the listing grid and the link form. Unlike the scripts, every
//! failure comes back as a [`ClientError`] instead of an empty widget.

pub mod chart;
pub mod currency;
pub mod grid;
pub mod submit;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{AddLinkData, ApiResponse, PaginateData, PriceHistory};
use chart::PriceChart;
use grid::{GridRequest, LISTING_ENDPOINT};
use submit::Navigation;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no price history for product {product_id}")]
    EmptyHistory { product_id: i64 },

    #[error("invalid server url {0:?}")]
    InvalidUrl(String),
}

pub struct PriceMonitorClient {
    http: reqwest::Client,
    base: Url,
}

impl PriceMonitorClient {
    /// `base_url` may carry a path prefix (`http://host/pm`); endpoints are
    /// resolved beneath it.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ClientError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    pub async fn fetch_histories(&self, product_id: i64) -> Result<Vec<PriceHistory>, ClientError> {
        let response = self
            .http
            .get(self.endpoint("/histories")?)
            .query(&[("product_id", product_id)])
            .send()
            .await?;

        let histories: Vec<PriceHistory> = decode(response).await?;
        if histories.is_empty() {
            return Err(ClientError::EmptyHistory { product_id });
        }
        Ok(histories)
    }

    /// Fetches a product's history and builds the detail-page chart from it.
    pub async fn load_chart(&self, product_id: i64) -> Result<PriceChart, ClientError> {
        let histories = self.fetch_histories(product_id).await?;
        Ok(PriceChart::from_histories(&histories))
    }

    pub async fn list_products(&self, request: &GridRequest) -> Result<PaginateData, ClientError> {
        let response = self
            .http
            .get(self.endpoint(LISTING_ENDPOINT)?)
            .query(request)
            .send()
            .await?;

        decode(response).await
    }

    pub async fn submit_link(&self, link: &str) -> Result<AddLinkData, ClientError> {
        let response = self
            .http
            .post(self.endpoint("/addlink")?)
            .form(&[("input_link", link)])
            .send()
            .await?;

        let envelope: ApiResponse<AddLinkData> = decode(response).await?;
        envelope
            .data
            .ok_or_else(|| ClientError::MalformedPayload("response carries no data.id".to_string()))
    }

    /// Submits the link and decides where the page goes next.
    pub async fn submit(&self, link: &str) -> Navigation {
        Navigation::from_outcome(self.submit_link(link).await)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or(body);
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::MalformedPayload(e.to_string()))
}
