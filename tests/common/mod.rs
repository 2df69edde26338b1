#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pricemonitor::model::ProductPayload;
use pricemonitor::{Database, Error, PriceMonitor, ProductSource, Result, Settings};

pub const ASSETS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");

/// Product pages keyed by link.
#[derive(Default)]
pub struct StubSource {
    pages: Mutex<HashMap<String, ProductPayload>>,
}

impl StubSource {
    pub fn with_product(self, link: &str, name: &str, current: i64, original: i64) -> Self {
        self.set(link, name, current, original);
        self
    }

    pub fn set(&self, link: &str, name: &str, current: i64, original: i64) {
        self.pages.lock().unwrap().insert(
            link.to_string(),
            ProductPayload {
                name: name.to_string(),
                current_price: current,
                original_price: original,
                url: link.to_string(),
                images: Vec::new(),
            },
        );
    }
}

#[async_trait]
impl ProductSource for StubSource {
    async fn fetch_product(&self, link: &str) -> Result<ProductPayload> {
        self.pages
            .lock()
            .unwrap()
            .get(link)
            .cloned()
            .ok_or_else(|| Error::Scrape {
                url: link.to_string(),
                reason: "product name not found".to_string(),
            })
    }
}

pub async fn monitor(source: Arc<StubSource>) -> PriceMonitor {
    let db = Database::in_memory().await.expect("in-memory database");
    PriceMonitor::new(Arc::new(db), source, &Settings::default())
}
