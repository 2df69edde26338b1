use std::sync::Arc;

use futures::future::join_all;
use tokio::time::sleep;

use crate::client::currency::CurrencyFormat;
use crate::config::{RefreshSettings, Settings};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::fetch::{sanitize_link, ProductSource};
use crate::model::{ListingRow, PaginateData, PriceHistory, Product, ProductRecord};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct PriceMonitor {
    db: Arc<Database>,
    source: Arc<dyn ProductSource>,
    currency: CurrencyFormat,
    history_limit: u32,
    page_size: u32,
    refresh: RefreshSettings,
}

impl PriceMonitor {
    pub fn new(db: Arc<Database>, source: Arc<dyn ProductSource>, settings: &Settings) -> Self {
        Self {
            db,
            source,
            currency: settings.currency.clone(),
            history_limit: settings.history_limit,
            page_size: settings.page_size,
            refresh: settings.refresh,
        }
    }

    pub fn currency(&self) -> &CurrencyFormat {
        &self.currency
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Scrapes the link and stores the product, returning its id.
    pub async fn register_product(&self, link: &str) -> Result<i64> {
        let link = sanitize_link(link);
        let product = self.source.fetch_product(&link).await?;
        let id = self.db.upsert_product(&product).await?;
        tracing::info!(id, name = %product.name, price = product.current_price, "registered product");
        Ok(id)
    }

    pub async fn get_product_detail(&self, id: i64) -> Result<Product> {
        let record = self
            .db
            .get_product_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {id}")))?;

        Ok(self.to_product(record))
    }

    /// One page of the listing grid. `start` is a row offset; a zero length
    /// means the default page size and a negative one means every row.
    pub async fn list_products(&self, draw: &str, start: i64, length: i64) -> Result<PaginateData> {
        let limit = match length {
            0 => i64::from(self.page_size),
            n if n < 0 => -1,
            n => n,
        };
        let offset = start.max(0);

        let products = self.db.get_products(limit, offset).await?;
        let total = self.db.get_total_products().await?;

        Ok(PaginateData {
            draw: draw.to_string(),
            records_total: total,
            records_filtered: total,
            products: products
                .into_iter()
                .map(|p| ListingRow {
                    id: p.id,
                    name: p.name,
                    current_price: p.current_price,
                    original_price: p.original_price,
                    url: Some(p.url).filter(|u| !u.is_empty()),
                })
                .collect(),
        })
    }

    /// The newest `limit` records, oldest first; 0 means the configured default.
    pub async fn list_price_history(&self, product_id: i64, limit: u32) -> Result<Vec<PriceHistory>> {
        let limit = if limit == 0 { self.history_limit } else { limit };
        self.db.get_last_price_history(product_id, i64::from(limit)).await
    }

    /// Scrapes every product that has a url again, a batch at a time.
    pub async fn refresh_product_information(&self) -> Result<RefreshSummary> {
        let products = self.db.get_products_with_url().await?;
        let mut summary = RefreshSummary::default();
        let batches = products.chunks(self.refresh.batch_size.max(1)).collect::<Vec<_>>();

        for (i, batch) in batches.iter().enumerate() {
            let results = join_all(batch.iter().map(|p| self.refresh_one(p))).await;

            for (product, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => summary.refreshed += 1,
                    Err(err) => {
                        summary.failed += 1;
                        tracing::warn!(id = product.id, url = %product.url, "refresh failed: {}", err);
                    }
                }
            }

            if i + 1 < batches.len() {
                sleep(self.refresh.pause).await;
            }
        }

        Ok(summary)
    }

    async fn refresh_one(&self, product: &ProductRecord) -> Result<()> {
        let mut payload = self.source.fetch_product(&product.url).await?;
        // A renamed listing keeps tracking the same row.
        if payload.name != product.name {
            tracing::debug!(id = product.id, old = %product.name, new = %payload.name, "product renamed");
            payload.name = product.name.clone();
        }
        self.db.upsert_product(&payload).await?;
        Ok(())
    }

    fn to_product(&self, record: ProductRecord) -> Product {
        Product {
            id: record.id,
            current_price_string: self.currency.format(record.current_price),
            original_price_string: self.currency.format(record.original_price),
            name: record.name,
            current_price: record.current_price,
            original_price: record.original_price,
            images: record.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductPayload;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned products by link and counts fetches.
    #[derive(Default)]
    struct StubSource {
        products: Mutex<HashMap<String, ProductPayload>>,
    }

    impl StubSource {
        fn set(&self, link: &str, name: &str, current: i64, original: i64) {
            self.products.lock().unwrap().insert(
                link.to_string(),
                ProductPayload {
                    name: name.to_string(),
                    current_price: current,
                    original_price: original,
                    url: link.to_string(),
                    images: vec![format!("{link}/img.jpg")],
                },
            );
        }
    }

    #[async_trait]
    impl ProductSource for StubSource {
        async fn fetch_product(&self, link: &str) -> Result<ProductPayload> {
            self.products
                .lock()
                .unwrap()
                .get(link)
                .cloned()
                .ok_or_else(|| Error::Scrape {
                    url: link.to_string(),
                    reason: "no such page".to_string(),
                })
        }
    }

    async fn monitor(source: Arc<StubSource>) -> PriceMonitor {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let mut settings = Settings::default();
        settings.refresh.pause = std::time::Duration::ZERO;
        settings.refresh.batch_size = 2;
        settings.history_limit = 2;
        settings.page_size = 2;
        PriceMonitor::new(db, source, &settings)
    }

    #[tokio::test]
    async fn registers_sanitized_link() {
        let source = Arc::new(StubSource::default());
        source.set("http://shop/a", "Kopi", 1_250_000, 1_500_000);
        let monitor = monitor(source).await;

        let id = monitor.register_product("<b>http://shop/a</b>").await.unwrap();
        let product = monitor.get_product_detail(id).await.unwrap();
        assert_eq!(product.name, "Kopi");
        assert_eq!(product.current_price_string, "Rp 1.250.000");
        assert_eq!(product.original_price_string, "Rp 1.500.000");
        assert_eq!(product.images, vec!["http://shop/a/img.jpg"]);
    }

    #[tokio::test]
    async fn unknown_link_fails_registration() {
        let monitor = monitor(Arc::new(StubSource::default())).await;
        let err = monitor.register_product("http://shop/missing").await.unwrap_err();
        assert!(matches!(err, Error::Scrape { .. }));
        assert_eq!(monitor.database().get_total_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let monitor = monitor(Arc::new(StubSource::default())).await;
        let err = monitor.get_product_detail(9).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_by_offset_with_default_page_size() {
        let source = Arc::new(StubSource::default());
        for name in ["a", "b", "c"] {
            source.set(&format!("http://shop/{name}"), name, 10, 20);
        }
        let monitor = monitor(source).await;
        for name in ["a", "b", "c"] {
            monitor.register_product(&format!("http://shop/{name}")).await.unwrap();
        }

        let first = monitor.list_products("1", 0, 0).await.unwrap();
        assert_eq!(first.draw, "1");
        assert_eq!(first.records_total, 3);
        assert_eq!(first.records_filtered, 3);
        assert_eq!(first.products.len(), 2);

        let second = monitor.list_products("2", 2, 2).await.unwrap();
        assert_eq!(second.products.len(), 1);
        assert_eq!(second.products[0].name, "c");
        assert_eq!(second.products[0].url.as_deref(), Some("http://shop/c"));

        let all = monitor.list_products("3", 0, -1).await.unwrap();
        assert_eq!(all.products.len(), 3);
    }

    #[tokio::test]
    async fn history_uses_default_limit() {
        let source = Arc::new(StubSource::default());
        source.set("http://shop/a", "Kopi", 100, 100);
        let monitor = monitor(source.clone()).await;
        let id = monitor.register_product("http://shop/a").await.unwrap();
        for price in [90, 80] {
            source.set("http://shop/a", "Kopi", price, 100);
            monitor.register_product("http://shop/a").await.unwrap();
        }

        let history = monitor.list_price_history(id, 0).await.unwrap();
        let prices: Vec<i64> = history.iter().map(|h| h.current_price).collect();
        assert_eq!(prices, vec![90, 80]);

        assert_eq!(monitor.list_price_history(id, 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn refresh_counts_failures_and_records_prices() {
        let source = Arc::new(StubSource::default());
        for name in ["a", "b", "c"] {
            source.set(&format!("http://shop/{name}"), name, 10, 20);
        }
        let monitor = monitor(source.clone()).await;
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(monitor.register_product(&format!("http://shop/{name}")).await.unwrap());
        }

        source.set("http://shop/a", "a (new title)", 5, 20);
        source.products.lock().unwrap().remove("http://shop/b");

        let summary = monitor.refresh_product_information().await.unwrap();
        assert_eq!(summary, RefreshSummary { refreshed: 2, failed: 1 });

        let a = monitor.get_product_detail(ids[0]).await.unwrap();
        assert_eq!(a.name, "a");
        assert_eq!(a.current_price, 5);
        assert_eq!(monitor.database().get_total_products().await.unwrap(), 3);
    }
}
