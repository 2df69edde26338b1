use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;

use crate::client::currency::CurrencyFormat;
use crate::model::ListingRow;
use crate::views::detail_path;

pub const LISTING_ENDPOINT: &str = "/list/product";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRender {
    /// The product name, linked to its shop page when a url is known.
    ProductName,
    CurrentPrice,
    OriginalPrice,
    DetailLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: &'static str,
    pub field: &'static str,
    pub render: CellRender,
}

/// Query sent by the grid for one page: `start` is a row offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRequest {
    pub draw: String,
    pub start: u32,
    pub length: u32,
}

impl GridRequest {
    pub fn new(draw: u64, start: u32, length: u32) -> Self {
        Self {
            draw: draw.to_string(),
            start,
            length,
        }
    }
}

/// Server-paged product table. Sorting is off; the server decides the order.
#[derive(Debug, Clone)]
pub struct ListingGrid {
    pub currency: CurrencyFormat,
    pub ordering: bool,
    pub server_side: bool,
    pub processing: bool,
    pub columns: Vec<Column>,
}

impl ListingGrid {
    pub fn new(currency: CurrencyFormat) -> Self {
        Self {
            currency,
            ordering: false,
            server_side: true,
            processing: true,
            columns: vec![
                Column { title: "Name", field: "name", render: CellRender::ProductName },
                Column { title: "Current Price", field: "current_price", render: CellRender::CurrentPrice },
                Column { title: "Original Price", field: "original_price", render: CellRender::OriginalPrice },
                Column { title: "Detail", field: "id", render: CellRender::DetailLink },
            ],
        }
    }

    pub fn render_row(&self, row: &ListingRow) -> Vec<String> {
        self.columns.iter().map(|c| self.render_cell(c, row)).collect()
    }

    pub fn render_cell(&self, column: &Column, row: &ListingRow) -> String {
        match column.render {
            CellRender::ProductName => match row.url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => format!(
                    r#"<a href="{}" target="_blank">{}</a>"#,
                    encode_double_quoted_attribute(url),
                    encode_text(&row.name)
                ),
                None => encode_text(&row.name).into_owned(),
            },
            CellRender::CurrentPrice => self.currency.format(row.current_price),
            CellRender::OriginalPrice => self.currency.format(row.original_price),
            CellRender::DetailLink => format!(r#"<a href="{}">Show</a>"#, detail_path(row.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: Option<&str>) -> ListingRow {
        ListingRow {
            id: 42,
            name: "Kopi & Teh".to_string(),
            current_price: 1_250_000,
            original_price: 1_500_000,
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn columns_map_fields_and_disable_sorting() {
        let grid = ListingGrid::new(CurrencyFormat::default());
        let fields: Vec<&str> = grid.columns.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["name", "current_price", "original_price", "id"]);
        assert!(!grid.ordering);
        assert!(grid.server_side);
    }

    #[test]
    fn renders_currency_and_detail_link() {
        let grid = ListingGrid::new(CurrencyFormat::default());
        let cells = grid.render_row(&row(None));
        assert_eq!(cells[0], "Kopi &amp; Teh");
        assert_eq!(cells[1], "Rp 1.250.000");
        assert_eq!(cells[2], "Rp 1.500.000");
        assert_eq!(cells[3], r#"<a href="/detailview?id=42">Show</a>"#);
    }

    #[test]
    fn name_links_only_when_url_present() {
        let grid = ListingGrid::new(CurrencyFormat::default());
        let linked = grid.render_row(&row(Some("https://shop.example/p?a=1&b=2")));
        assert_eq!(
            linked[0],
            r#"<a href="https://shop.example/p?a=1&amp;b=2" target="_blank">Kopi &amp; Teh</a>"#
        );

        let empty = grid.render_row(&row(Some("")));
        assert_eq!(empty[0], "Kopi &amp; Teh");
    }

    #[test]
    fn price_cells_follow_render_kind_not_field_name() {
        let grid = ListingGrid::new(CurrencyFormat::default());
        let relabelled = Column {
            title: "Was",
            field: "was_price",
            render: CellRender::OriginalPrice,
        };
        assert_eq!(grid.render_cell(&relabelled, &row(None)), "Rp 1.500.000");

        let now = Column {
            title: "Now",
            field: "price_now",
            render: CellRender::CurrentPrice,
        };
        assert_eq!(grid.render_cell(&now, &row(None)), "Rp 1.250.000");
    }
}
