//! Server-rendered pages hosting the browser scripts under `/static`.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::client::grid::ListingGrid;
use crate::model::Product;

const JQUERY: &str = "https://code.jquery.com/jquery-3.7.1.min.js";
const CHART_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/2.9.4/Chart.min.js";
const DATATABLES_JS: &str = "https://cdn.datatables.net/1.13.8/js/jquery.dataTables.min.js";
const DATATABLES_CSS: &str = "https://cdn.datatables.net/1.13.8/css/jquery.dataTables.min.css";

pub fn detail_path(id: i64) -> String {
    format!("/detailview?id={id}")
}

fn layout(title: &str, head: &str, body: &str, scripts: &[&str]) -> String {
    let scripts = scripts
        .iter()
        .map(|src| format!(r#"<script src="{src}"></script>"#))
        .collect::<Vec<_>>()
        .join("\n    ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    {head}
</head>
<body>
    <nav>
        <a href="/">Input Link</a> |
        <a href="/listview">List All Price</a>
    </nav>
    <main>
{body}
    </main>
    {scripts}
</body>
</html>
"#,
        title = encode_text(title),
    )
}

pub fn index_page() -> String {
    let body = r#"        <h1>Input Link</h1>
        <form id="form-link">
            <input id="input-link" name="input_link" type="url" placeholder="https://" required>
            <button type="submit">Track</button>
        </form>"#;

    layout("Input Link", "", body, &[JQUERY, "/static/site.js"])
}

pub fn list_page(grid: &ListingGrid) -> String {
    let head = format!(r#"<link rel="stylesheet" href="{DATATABLES_CSS}">"#);
    let headings = grid
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", encode_text(c.title)))
        .collect::<String>();
    let body = format!(
        r#"        <h1>List All Price</h1>
        <table id="list" class="display" data-currency-marker="{marker}" data-currency-separator="{separator}">
            <thead>
                <tr>{headings}</tr>
            </thead>
        </table>"#,
        marker = encode_double_quoted_attribute(&grid.currency.marker),
        separator = encode_double_quoted_attribute(&grid.currency.separator.to_string()),
    );

    layout("List All Price", &head, &body, &[JQUERY, DATATABLES_JS, "/static/list.js"])
}

pub fn detail_page(product: &Product) -> String {
    let images = product
        .images
        .iter()
        .map(|src| format!(r#"            <img src="{}" alt="" width="120">"#, encode_double_quoted_attribute(src)))
        .collect::<Vec<_>>()
        .join("\n");

    let body = format!(
        r#"        <h1>{name}</h1>
        <p>Current price: <strong>{current}</strong></p>
        <p>Original price: <s>{original}</s></p>
        <div class="images">
{images}
        </div>
        <canvas id="myChart" data-product-id="{id}"></canvas>"#,
        name = encode_text(&product.name),
        current = encode_text(&product.current_price_string),
        original = encode_text(&product.original_price_string),
        id = product.id,
    );

    layout(
        &format!("Detail Product - {}", product.name),
        "",
        &body,
        &[JQUERY, CHART_JS, "/static/detail.js"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::currency::CurrencyFormat;

    #[test]
    fn image_sources_cannot_break_out_of_the_attribute() {
        let product = Product {
            id: 1,
            name: "Tea".to_string(),
            current_price: 1,
            current_price_string: "Rp 1".to_string(),
            original_price: 1,
            original_price_string: "Rp 1".to_string(),
            images: vec![r#"https://img.example/a.jpg?w=1&h=2" onerror="x"#.to_string()],
        };
        let html = detail_page(&product);
        assert!(html.contains(r#"src="https://img.example/a.jpg?w=1&amp;h=2&quot; onerror=&quot;x""#));
        assert!(!html.contains(r#"" onerror=""#));
    }

    #[test]
    fn detail_page_carries_product_id_and_escaped_name() {
        let product = Product {
            id: 13,
            name: "<Kopi>".to_string(),
            current_price: 1000,
            current_price_string: "Rp 1.000".to_string(),
            original_price: 2000,
            original_price_string: "Rp 2.000".to_string(),
            images: vec!["https://img.example/a.jpg".to_string()],
        };
        let html = detail_page(&product);
        assert!(html.contains(r#"data-product-id="13""#));
        assert!(html.contains("<title>Detail Product - &lt;Kopi&gt;</title>"));
        assert!(html.contains("Rp 2.000"));
        assert!(html.contains("/static/detail.js"));
    }

    #[test]
    fn list_page_uses_grid_columns_and_currency() {
        let html = list_page(&ListingGrid::new(CurrencyFormat::default()));
        assert!(html.contains("<th>Name</th><th>Current Price</th><th>Original Price</th><th>Detail</th>"));
        assert!(html.contains(r#"data-currency-marker="Rp ""#));
        assert!(html.contains(r#"data-currency-separator=".""#));
    }

    #[test]
    fn index_page_has_link_form() {
        let html = index_page();
        assert!(html.contains(r#"id="form-link""#));
        assert!(html.contains(r#"id="input-link""#));
    }
}
