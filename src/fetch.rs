use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::model::ProductPayload;

static NAME: LazyLock<Selector> = LazyLock::new(|| selector("h1#product-name"));
static FINAL_PRICE: LazyLock<Selector> = LazyLock::new(|| selector("div#product-final-price"));
static DISCOUNT_PRICE: LazyLock<Selector> =
    LazyLock::new(|| selector("div#product-discount-price"));
static GALLERY_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector(".css-1iv32ek > *"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img#product-image"));

// Everything from the decimal comma on, then any remaining non-digit.
static NON_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",.*|\D").expect("valid regex"));
static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Where product information comes from. The HTTP scraper is the real one;
/// tests plug in fixed pages.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_product(&self, link: &str) -> Result<ProductPayload>;
}

pub struct HttpProductSource {
    client: reqwest::Client,
}

impl HttpProductSource {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .gzip(true).brotli(true).deflate(true)
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let html = self.client.get(url)
            .send().await?
            .error_for_status()?
            .text().await?;

        Ok(html)
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn fetch_product(&self, link: &str) -> Result<ProductPayload> {
        let html = self.fetch_html(link).await?;
        extract_product(&html, link)
    }
}

pub fn extract_product(html: &str, url: &str) -> Result<ProductPayload> {
    let doc = Html::parse_document(html);

    let name = doc
        .select(&NAME)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::Scrape {
            url: url.to_string(),
            reason: "product name not found".to_string(),
        })?;

    let first_price = |sel: &Selector| {
        doc.select(sel)
            .next()
            .map(|n| parse_price(&n.text().collect::<String>()))
            .unwrap_or(0)
    };
    let current_price = first_price(&FINAL_PRICE);
    let original_price = first_price(&DISCOUNT_PRICE);

    let mut images = Vec::new();
    for item in doc.select(&GALLERY_ITEMS) {
        let src = item
            .select(&IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default();
        // Drop the crop/resize query parameters.
        let src = src.split('&').next().unwrap_or_default();
        if !src.is_empty() {
            images.push(src.to_string());
        }
    }

    Ok(ProductPayload {
        name,
        current_price,
        original_price,
        url: url.to_string(),
        images,
    })
}

/// Turns a displayed price such as `Rp1.250.000,00` into whole units.
/// Anything that does not leave a number behind is 0.
pub fn parse_price(text: &str) -> i64 {
    NON_PRICE.replace_all(text, "").parse().unwrap_or(0)
}

/// Strips markup from user input. Entities are left alone so query strings
/// such as `?a=1&copy=2` survive untouched.
pub fn sanitize_link(input: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(input, "");
    TAG.replace_all(&without_scripts, "").trim().to_string()
}
