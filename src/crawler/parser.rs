//! HTML parser for listing pages and item pages
//!
//! This module handles:
//! - Collecting raw anchor hrefs from a listing page by CSS selector
//! - Extracting title, price and image from an item page
//!
//! Each item field is extracted independently into an [`Extraction`], so a
//! field that is simply missing is distinguishable from one whose
//! extraction broke.

use crate::state::ProductRecord;
use scraper::{Html, Node, Selector};
use url::Url;

/// Result of extracting a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    /// The field was present
    Found(T),
    /// The page does not carry the field
    Absent,
    /// The extraction itself went wrong
    Failed(String),
}

impl Extraction<String> {
    /// Converts into the record field value; absence becomes an empty string
    pub fn into_field(self) -> Result<String, String> {
        match self {
            Self::Found(value) => Ok(value),
            Self::Absent => Ok(String::new()),
            Self::Failed(message) => Err(message),
        }
    }
}

/// Fields extracted from one item page
#[derive(Debug, Clone)]
pub struct ParsedProduct {
    pub title: Extraction<String>,
    pub price: Extraction<String>,
    pub image: Extraction<String>,
}

impl ParsedProduct {
    /// Builds the record for `link`, failing if any field extraction failed
    pub fn into_record(self, link: &str) -> Result<ProductRecord, String> {
        Ok(ProductRecord {
            title: self.title.into_field().map_err(|e| format!("title: {}", e))?,
            price: self.price.into_field().map_err(|e| format!("price: {}", e))?,
            image: self.image.into_field().map_err(|e| format!("image: {}", e))?,
            link: link.to_string(),
        })
    }
}

/// Parses an item page
///
/// # Field Rules
///
/// - **title**: first non-blank `og:title` meta content, else empty; the
///   `<title>` tag is not consulted
/// - **price**: first visible text fragment containing one of `currency_markers`
/// - **image**: first `og:image` meta content, resolved against `page_url`
///
/// # Example
///
/// ```
/// use catalog_harvest::crawler::parse_product;
/// use url::Url;
///
/// let html = r#"<html><head><meta property="og:title" content="Shoe X"></head>
///     <body><div>₹1,299</div></body></html>"#;
/// let page = Url::parse("https://shop.example.com/p/1").unwrap();
/// let parsed = parse_product(html, &page, &["₹".to_string()]);
/// let record = parsed.into_record(page.as_str()).unwrap();
/// assert_eq!(record.title, "Shoe X");
/// assert_eq!(record.price, "₹1,299");
/// ```
pub fn parse_product(html: &str, page_url: &Url, currency_markers: &[String]) -> ParsedProduct {
    let document = Html::parse_document(html);

    let title = extract_meta(&document, "og:title");
    let price = extract_price(&document, currency_markers);
    let image = match extract_meta(&document, "og:image") {
        Extraction::Found(src) => Extraction::Found(
            page_url
                .join(&src)
                .map(|u| u.to_string())
                .unwrap_or(src),
        ),
        other => other,
    };

    ParsedProduct {
        title,
        price,
        image,
    }
}

/// Collects the raw `href` of every element matching `selector`
///
/// Hrefs are returned as written; resolving and normalizing is up to the caller.
pub fn extract_hrefs(html: &str, selector: &str) -> Result<Vec<String>, String> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect())
}

/// Returns true if any element matches `selector`
pub fn has_match(html: &str, selector: &str) -> Result<bool, String> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().is_some())
}

fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector '{}': {}", selector, e))
}

/// Extracts the content of `<meta property="...">`
fn extract_meta(document: &Html, property: &str) -> Extraction<String> {
    let selector = match parse_selector(&format!("meta[property='{}']", property)) {
        Ok(selector) => selector,
        Err(e) => return Extraction::Failed(e),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(|content| Extraction::Found(content.to_string()))
        .unwrap_or(Extraction::Absent)
}

/// Finds the first visible text node that carries a currency marker
fn extract_price(document: &Html, currency_markers: &[String]) -> Extraction<String> {
    if currency_markers.is_empty() {
        return Extraction::Absent;
    }

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| matches!(element.name(), "script" | "style" | "noscript" | "title"))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let fragment = text.trim();
        if currency_markers.iter().any(|marker| fragment.contains(marker.as_str())) {
            return Extraction::Found(fragment.to_string());
        }
    }

    Extraction::Absent
}
