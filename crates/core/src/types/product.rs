//! Catalog product.

use serde::{Deserialize, Serialize};

use super::{Price, ProductCode};

/// A product as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog code.
    pub code: ProductCode,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image path or `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Average review score, 0 to 5.
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews.
    #[serde(default)]
    pub reviews: u32,
}

impl Product {
    /// Maximum rating a product can have.
    pub const MAX_STARS: u8 = 5;

    /// Rating rendered as five stars, e.g. `★★★☆☆` for 3.7.
    #[must_use]
    pub fn stars(&self) -> String {
        // Clamped to 0..=5 before the cast.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let full = if self.rating.is_finite() {
            self.rating.clamp(0.0, f64::from(Self::MAX_STARS)).floor() as u8
        } else {
            0
        };
        let mut stars = "★".repeat(usize::from(full));
        stars.push_str(&"☆".repeat(usize::from(Self::MAX_STARS - full)));
        stars
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(rating: f64) -> Product {
        Product {
            code: ProductCode::parse("JM001").unwrap(),
            name: "Catan".to_string(),
            price: Price::from_pesos(29_990),
            image: None,
            description: None,
            rating,
            reviews: 0,
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(product(3.7).stars(), "★★★☆☆");
        assert_eq!(product(0.0).stars(), "☆☆☆☆☆");
        assert_eq!(product(9.0).stars(), "★★★★★");
        assert_eq!(product(-1.0).stars(), "☆☆☆☆☆");
        assert_eq!(product(f64::NAN).stars(), "☆☆☆☆☆");
    }

    #[test]
    fn test_decode_catalog_entry() {
        let p: Product = serde_json::from_value(json!({
            "code": "JM001",
            "name": "Catan",
            "price": 29990,
            "image": "/img/catan.png",
            "category": "Juegos de Mesa"
        }))
        .unwrap();
        assert_eq!(p.code.as_str(), "JM001");
        assert_eq!(p.price, Price::from_pesos(29_990));
        assert_eq!(p.image.as_deref(), Some("/img/catan.png"));
        assert_eq!(p.reviews, 0);
    }
}
