//! Product records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::required;
use super::{Price, ProductId, ValidationError};

/// Star rating from 0 to 5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Invalid`] above [`Rating::MAX`].
    pub fn new(stars: u8) -> Result<Self, ValidationError> {
        if stars > Self::MAX {
            return Err(ValidationError::invalid(
                "rating",
                format!("must be between 0 and {}", Self::MAX),
            ));
        }
        Ok(Self(stars))
    }

    /// Number of filled stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Free-text description, one entry per bullet line.
    pub description: Vec<String>,
    pub category: String,
    pub price: Price,
    /// Discounted price shown to shoppers.
    pub offer_price: Price,
    pub in_stock: bool,
    pub rating: Rating,
    /// Image URLs, first one is the cover image.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a shopper pays: the offer price, or the list price when no offer is set.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        if self.offer_price == Price::ZERO {
            self.price
        } else {
            self.offer_price
        }
    }
}

/// Seller input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
    pub category: String,
    pub price: Price,
    pub offer_price: Price,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
    #[serde(default)]
    pub rating: Rating,
    /// Image URLs. Uploads fill this in; JSON updates may keep existing URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

const fn in_stock_default() -> bool {
    true
}

impl NewProduct {
    /// Trim text fields and split multi-line description entries.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Missing`] for a blank name or category, and
    /// [`ValidationError::Invalid`] for a price above [`Price::MAX`].
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let name = required("name", &self.name)?;
        let category = required("category", &self.category)?;
        for (field, price) in [("price", self.price), ("offerPrice", self.offer_price)] {
            if price > Price::MAX {
                return Err(ValidationError::invalid(
                    field,
                    format!("must be at most {}", Price::MAX),
                ));
            }
        }
        let description = self
            .description
            .iter()
            .flat_map(|entry| entry.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            name,
            category,
            description,
            ..self
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(5).is_ok());
        assert!(Rating::new(6).is_err());
        assert!(serde_json::from_value::<Rating>(json!(9)).is_err());
    }

    #[test]
    fn test_new_product_defaults_and_normalization() {
        let input: NewProduct = serde_json::from_value(json!({
            "name": "  Fresh Basil ",
            "category": "Vegetables",
            "price": "4.00",
            "offerPrice": "3.50",
            "description": ["Fragrant leaves\nGrown locally", "  "]
        }))
        .unwrap();
        assert!(input.in_stock);
        assert_eq!(input.rating, Rating::default());

        let product = input.normalized().unwrap();
        assert_eq!(product.name, "Fresh Basil");
        assert_eq!(product.description, vec!["Fragrant leaves", "Grown locally"]);
    }

    #[test]
    fn test_new_product_rejects_prices_above_storable_max() {
        let product = |price: &str, offer: &str| {
            serde_json::from_value::<NewProduct>(json!({
                "name": "Saffron",
                "category": "Spices",
                "price": price,
                "offerPrice": offer
            }))
            .unwrap()
        };

        assert!(product("9999999999.99", "9999999999.99").normalized().is_ok());

        let err = product("10000000000", "1").normalized().unwrap_err();
        assert_eq!(err.to_string(), "price must be at most $9999999999.99");

        let err = product("1", "10000000000").normalized().unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "offerPrice", .. }));
    }

    #[test]
    fn test_new_product_rejects_negative_and_blank() {
        let negative = serde_json::from_value::<NewProduct>(json!({
            "name": "Salt",
            "category": "Grains",
            "price": "-1",
            "offerPrice": "1"
        }));
        assert!(negative.is_err());

        let blank: NewProduct = serde_json::from_value(json!({
            "name": " ",
            "category": "Grains",
            "price": "1",
            "offerPrice": "1"
        }))
        .unwrap();
        assert_eq!(blank.normalized(), Err(ValidationError::Missing("name")));
    }
}
