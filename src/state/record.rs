use serde::{Deserialize, Serialize};

/// Structured data extracted from one item page
///
/// Field order is the column order of the CSV snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Item title; empty when the page had none
    pub title: String,

    /// First price-looking text fragment; empty when absent
    pub price: String,

    /// Primary image URL; empty when absent
    pub image: String,

    /// Canonical URL of the candidate this record came from
    pub link: String,
}

impl ProductRecord {
    /// Returns true if the record may enter the result set
    ///
    /// Both title and link must be non-empty.
    pub fn is_retainable(&self) -> bool {
        !self.title.trim().is_empty() && !self.link.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, link: &str) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            link: link.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_retainable_requires_title_and_link() {
        assert!(record("Shoe X", "https://shop.example.com/p/a").is_retainable());
        assert!(!record("", "https://shop.example.com/p/a").is_retainable());
        assert!(!record("   ", "https://shop.example.com/p/a").is_retainable());
        assert!(!record("Shoe X", "").is_retainable());
    }

    #[test]
    fn test_empty_price_and_image_are_fine() {
        let record = record("Shoe X", "https://shop.example.com/p/a");
        assert!(record.price.is_empty());
        assert!(record.image.is_empty());
        assert!(record.is_retainable());
    }
}
