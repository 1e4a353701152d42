//! Categories and products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use fastlanche_core::{CategoryId, Money, ProductId};

use crate::validation::ValidationErrors;

/// A menu category (burgers, drinks, desserts...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A menu item. Only `available` products can be ordered.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub is_promotion: bool,
    /// Price before the promotion, shown struck through.
    pub old_price: Option<Money>,
    pub category_id: CategoryId,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns field errors for a blank name.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name);
        errors.finish()
    }
}

/// Deserialize a field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default)]`: an absent field stays `None`, an explicit
/// `null` becomes `Some(None)`, and a value becomes `Some(Some(v))`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial category update. Absent fields are left unchanged; `null`
/// clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

impl CategoryUpdate {
    /// # Errors
    ///
    /// Returns field errors for a blank name.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require_text("name", name);
        }
        errors.finish()
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_promotion: bool,
    pub old_price: Option<Money>,
    pub category_id: CategoryId,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl NewProduct {
    /// # Errors
    ///
    /// Returns field errors for a blank name or an out-of-range price.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name);
        errors.require_price("price", self.price);
        if let Some(old_price) = self.old_price {
            errors.require_price("oldPrice", old_price);
        }
        errors.finish()
    }
}

/// Partial product update. Absent fields are left unchanged; `null`
/// clears a nullable field (e.g. `oldPrice` once a promotion ends).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub price: Option<Money>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub is_featured: Option<bool>,
    pub is_promotion: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub old_price: Option<Option<Money>>,
    pub category_id: Option<CategoryId>,
    pub available: Option<bool>,
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Returns field errors for a blank name or an out-of-range price.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require_text("name", name);
        }
        if let Some(price) = self.price {
            errors.require_price("price", price);
        }
        if let Some(Some(old_price)) = self.old_price {
            errors.require_price("oldPrice", old_price);
        }
        errors.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let product: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "X-Salada",
            "price": "21.90",
            "categoryId": 1
        }))
        .unwrap();
        assert!(product.available);
        assert!(!product.is_featured);
        assert!(!product.is_promotion);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_new_product_rejects_negative_price() {
        let product: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "",
            "price": "-1.00",
            "categoryId": 1
        }))
        .unwrap();
        let errors = product.validate().unwrap_err();
        let paths: Vec<_> = errors.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "price"]);
    }

    #[test]
    fn test_new_product_rejects_price_over_column_limit() {
        let product: NewProduct = serde_json::from_value(serde_json::json!({
            "name": "X-Ouro",
            "price": "100000000.00",
            "oldPrice": "99999999.99",
            "categoryId": 1
        }))
        .unwrap();
        let errors = product.validate().unwrap_err();
        let paths: Vec<_> = errors.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["price"]);
    }

    #[test]
    fn test_update_rejects_old_price_over_column_limit() {
        let update: ProductUpdate =
            serde_json::from_value(serde_json::json!({ "oldPrice": "1000000000" })).unwrap();
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.errors()[0].path, "oldPrice");
    }

    #[test]
    fn test_update_null_clears_old_price() {
        let update: ProductUpdate =
            serde_json::from_value(serde_json::json!({ "oldPrice": null, "isPromotion": false }))
                .unwrap();
        assert_eq!(update.old_price, Some(None));
        assert_eq!(update.is_promotion, Some(false));
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let update: ProductUpdate =
            serde_json::from_value(serde_json::json!({ "description": "Novo" })).unwrap();
        assert_eq!(update.description, Some(Some("Novo".to_string())));
        assert_eq!(update.old_price, None);
        assert_eq!(update.image_url, None);

        let update: CategoryUpdate =
            serde_json::from_value(serde_json::json!({ "imageUrl": null })).unwrap();
        assert_eq!(update.image_url, Some(None));
        assert_eq!(update.description, None);
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(ProductUpdate::default().validate().is_ok());
        assert!(CategoryUpdate::default().validate().is_ok());
    }
}
