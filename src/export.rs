use anyhow::Result;
use chrono::Utc;
use csv::Writer;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::model::PriceHistory;

#[derive(Serialize)]
struct HistoryCsvRow<'a> {
    product_id: i64,
    update_time: String,
    current_price: i64,
    original_price: i64,
    current_price_string: &'a str,
    original_price_string: &'a str,
}

pub fn write_history<W: Write>(
    history: &[PriceHistory],
    format_price: impl Fn(i64) -> String,
    out: W,
) -> Result<()> {
    let mut wtr = Writer::from_writer(out);

    for h in history {
        let current = format_price(h.current_price);
        let original = format_price(h.original_price);
        wtr.serialize(HistoryCsvRow {
            product_id: h.product_id,
            update_time: h.update_time.to_rfc3339(),
            current_price: h.current_price,
            original_price: h.original_price,
            current_price_string: &current,
            original_price_string: &original,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_history_to_csv<P: AsRef<Path>>(
    history: &[PriceHistory],
    format_price: impl Fn(i64) -> String,
    file_path: P,
) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(file_path)?;

    write_history(history, format_price, file)
}

pub fn generate_filename(product_id: i64) -> String {
    let now = Utc::now();
    format!("price_history_{}_{}.csv", product_id, now.format("%Y%m%d_%H%M%S"))
}
