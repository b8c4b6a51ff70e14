//! URL handling module for Catalog-Harvest
//!
//! This module provides listing-page URL expansion, link resolution and the
//! canonical form used as the dedup key for candidate links.

mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use normalize::{normalize_url, resolve_link};

/// Placeholder replaced by the 1-based page index in the listing template
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Expands the listing URL template for the given page index
///
/// # Arguments
///
/// * `template` - URL containing a `{page}` placeholder
/// * `page` - The 1-based listing page index
///
/// # Returns
///
/// * `Ok(Url)` - The absolute listing page URL
/// * `Err(UrlError)` - The template has no placeholder or is not an http(s) URL
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::listing_page_url;
///
/// let url = listing_page_url("https://shop.example.com/list?page={page}", 3).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/list?page=3");
/// ```
pub fn listing_page_url(template: &str, page: u32) -> Result<Url, UrlError> {
    if !template.contains(PAGE_PLACEHOLDER) {
        return Err(UrlError::MissingPlaceholder(template.to_string()));
    }

    let expanded = template.replace(PAGE_PLACEHOLDER, &page.to_string());
    let url = Url::parse(&expanded).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_query_placeholder() {
        let url = listing_page_url("https://shop.example.com/search?q=laptops&page={page}", 12)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/search?q=laptops&page=12"
        );
    }

    #[test]
    fn test_expand_path_placeholder() {
        let url = listing_page_url("http://127.0.0.1:8080/list/{page}", 1).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/list/1");
    }

    #[test]
    fn test_missing_placeholder() {
        let result = listing_page_url("https://shop.example.com/list", 1);
        assert!(matches!(result, Err(UrlError::MissingPlaceholder(_))));
    }

    #[test]
    fn test_invalid_scheme() {
        let result = listing_page_url("ftp://shop.example.com/{page}", 1);
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_not_a_url() {
        let result = listing_page_url("page {page}", 1);
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }
}
