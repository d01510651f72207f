//! Product documents
//!
//! Stored in the `products` collection with camelCase field names, matching
//! what the storefront frontend already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Stored product body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: f64,
    pub category: Uuid,
    #[serde(default)]
    pub count_in_stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "Utc::now")]
    pub date_created: DateTime<Utc>,
}

/// Body of `POST /products`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub count_in_stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub is_featured: bool,
}

impl Product {
    /// Build a product from a create request whose category was resolved
    pub fn create(new: NewProduct, category: Uuid) -> Result<Self, DomainError> {
        let image = new
            .image
            .filter(|url| !url.trim().is_empty())
            .ok_or(DomainError::MissingImage)?;

        let product = Self {
            name: new.name,
            description: new.description,
            rich_description: new.rich_description,
            image,
            images: Vec::new(),
            brand: new.brand,
            price: new.price,
            category,
            count_in_stock: new.count_in_stock,
            rating: new.rating,
            num_reviews: new.num_reviews,
            is_featured: new.is_featured,
            date_created: Utc::now(),
        };
        product.validate()?;

        Ok(product)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        check_price(self.price)?;
        check_stock(self.count_in_stock)?;
        Ok(())
    }
}

/// Body of `PUT /products/:id`; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_in_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_reviews: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl ProductUpdate {
    /// Turn the update into a JSON merge patch.
    ///
    /// `category` is the resolved category id; an empty image keeps the
    /// stored one.
    pub fn into_patch(mut self, category: Uuid) -> Result<serde_json::Value, DomainError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::MissingField("name"));
            }
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.count_in_stock {
            check_stock(stock)?;
        }

        self.image = self.image.filter(|url| !url.trim().is_empty());
        self.category = Some(category.to_string());

        serde_json::to_value(&self).map_err(|e| DomainError::InvalidField {
            field: "product",
            reason: e.to_string(),
        })
    }
}

/// Body of `PUT /products/gallery-images/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryUpdate {
    /// File names under /public/uploads
    #[serde(default)]
    pub images: Vec<String>,
}

impl GalleryUpdate {
    /// Resolve file names against the public upload base URL
    pub fn image_urls(&self, base: &str) -> Vec<String> {
        self.images
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}{}", base, name.replace(' ', "-")))
            .collect()
    }
}

fn check_price(price: f64) -> Result<(), DomainError> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::InvalidField {
            field: "price",
            reason: "must be a non-negative number".to_string(),
        });
    }
    Ok(())
}

fn check_stock(count: i64) -> Result<(), DomainError> {
    if !(0..=255).contains(&count) {
        return Err(DomainError::InvalidField {
            field: "countInStock",
            reason: "must be between 0 and 255".to_string(),
        });
    }
    Ok(())
}
