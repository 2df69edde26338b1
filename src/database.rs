use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use crate::error::{Error, Result};
use crate::model::{PriceHistory, ProductPayload, ProductRecord};

const IMAGE_ACTIVE: i64 = 1;
const IMAGE_DELETED: i64 = 0;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.up().await?;
        Ok(db)
    }

    /// A private database living as long as its single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.up().await?;
        Ok(db)
    }

    async fn up(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                current_price INTEGER NOT NULL,
                original_price INTEGER NOT NULL,
                url TEXT,
                updated_at TEXT NOT NULL
            );
            "#
        ).execute(&self.pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                current_price INTEGER NOT NULL,
                original_price INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (product_id) REFERENCES product (id)
            );
            "#
        ).execute(&self.pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS product_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                image TEXT NOT NULL,
                status INTEGER NOT NULL,
                FOREIGN KEY (product_id) REFERENCES product (id)
            );
            "#
        ).execute(&self.pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_product_ts ON price_history(product_id, updated_at);")
            .execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_images_product ON product_images(product_id, status);")
            .execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_product_updated_at ON product(updated_at);")
            .execute(&self.pool).await?;

        Ok(())
    }

    /// Inserts the product or updates it by name, syncs its images and
    /// appends a price-history row, all in one transaction.
    pub async fn upsert_product(&self, payload: &ProductPayload) -> Result<i64> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO product (name, current_price, original_price, url, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (name) DO UPDATE SET
                current_price = excluded.current_price,
                original_price = excluded.original_price,
                url = excluded.url,
                updated_at = excluded.updated_at
            RETURNING id
            "#
        )
        .bind(&payload.name)
        .bind(payload.current_price)
        .bind(payload.original_price)
        .bind(&payload.url)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;
        let product_id: i64 = row.get("id");

        sync_images(&mut tx, product_id, &payload.images).await?;

        sqlx::query("INSERT INTO price_history (product_id, current_price, original_price, updated_at) VALUES (?, ?, ?, ?)")
            .bind(product_id)
            .bind(payload.current_price)
            .bind(payload.original_price)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product_id)
    }

    pub async fn insert_price_history(&self, product_id: i64, current_price: i64, original_price: i64) -> Result<()> {
        sqlx::query("INSERT INTO price_history (product_id, current_price, original_price, updated_at) VALUES (?, ?, ?, ?)")
            .bind(product_id)
            .bind(current_price)
            .bind(original_price)
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_product_by_id(&self, id: i64) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT id, name, current_price, original_price, COALESCE(url, '') AS url, updated_at FROM product WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut product = product_from_row(&row)?;
        product.images = sqlx::query_scalar::<_, String>(
            "SELECT image FROM product_images WHERE product_id = ? AND status = ? ORDER BY id ASC"
        )
        .bind(id)
        .bind(IMAGE_ACTIVE)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(product))
    }

    pub async fn get_products(&self, limit: i64, offset: i64) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, current_price, original_price, COALESCE(url, '') AS url, updated_at
            FROM product
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut products = rows.iter().map(product_from_row).collect::<Result<Vec<_>>>()?;
        self.attach_images(&mut products).await?;
        Ok(products)
    }

    pub async fn get_total_products(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM product")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    /// Products that can be scraped again.
    pub async fn get_products_with_url(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, current_price, original_price, url, updated_at
            FROM product
            WHERE url IS NOT NULL AND url <> ''
            ORDER BY id ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    pub async fn get_products_by_update_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, current_price, original_price, COALESCE(url, '') AS url, updated_at
            FROM product
            WHERE updated_at BETWEEN ? AND ?
            ORDER BY updated_at ASC
            "#
        )
        .bind(timestamp(start))
        .bind(timestamp(end))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    /// The most recent `limit` history rows, oldest first.
    pub async fn get_last_price_history(&self, product_id: i64, limit: i64) -> Result<Vec<PriceHistory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, current_price, original_price, updated_at FROM (
                SELECT id, product_id, current_price, original_price, updated_at
                FROM price_history
                WHERE product_id = ?
                ORDER BY updated_at DESC, id DESC
                LIMIT ?
            ) ORDER BY updated_at ASC, id ASC
            "#
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let updated_at: String = row.get("updated_at");
            history.push(PriceHistory {
                id: row.get("id"),
                product_id: row.get("product_id"),
                current_price: row.get("current_price"),
                original_price: row.get("original_price"),
                update_time: parse_timestamp(&updated_at)?,
            });
        }

        Ok(history)
    }

    async fn attach_images(&self, products: &mut [ProductRecord]) -> Result<()> {
        if products.is_empty() {
            return Ok(());
        }

        // SQLite has no array binding; the ids are integers we read ourselves.
        let ids = products
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT product_id, image FROM product_images WHERE product_id IN ({ids}) AND status = ? ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(IMAGE_ACTIVE)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let product_id: i64 = row.get("product_id");
            if let Some(product) = products.iter_mut().find(|p| p.id == product_id) {
                product.images.push(row.get("image"));
            }
        }
        Ok(())
    }
}

async fn sync_images(tx: &mut Transaction<'_, Sqlite>, product_id: i64, images: &[String]) -> Result<()> {
    let existing = sqlx::query("SELECT id, image FROM product_images WHERE product_id = ? AND status = ?")
        .bind(product_id)
        .bind(IMAGE_ACTIVE)
        .fetch_all(&mut **tx)
        .await?;

    let mut stale: Vec<(i64, String)> = existing
        .iter()
        .map(|row| (row.get("id"), row.get("image")))
        .collect();

    for image in images {
        if let Some(pos) = stale.iter().position(|(_, existing)| existing == image) {
            stale.swap_remove(pos);
            continue;
        }

        sqlx::query("INSERT INTO product_images (product_id, image, status) VALUES (?, ?, ?)")
            .bind(product_id)
            .bind(image)
            .bind(IMAGE_ACTIVE)
            .execute(&mut **tx)
            .await?;
    }

    for (id, _) in stale {
        sqlx::query("UPDATE product_images SET status = ? WHERE id = ?")
            .bind(IMAGE_DELETED)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

fn product_from_row(row: &SqliteRow) -> Result<ProductRecord> {
    let updated_at: String = row.get("updated_at");
    Ok(ProductRecord {
        id: row.get("id"),
        name: row.get("name"),
        current_price: row.get("current_price"),
        original_price: row.get("original_price"),
        url: row.get("url"),
        images: Vec::new(),
        updated_at: parse_timestamp(&updated_at)?,
    })
}

// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| Error::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}
