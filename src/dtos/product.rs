// src/dtos/product.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dtos::category::CategoryResponse;
use crate::error::AppError;
use crate::models::category::Category;
use crate::models::product::{Product, ProductStatus, StockLevel};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image: Option<String>,
    pub status: Option<ProductStatus>,
    pub categories: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image: Option<String>,
    pub status: Option<ProductStatus>,
    pub categories: Option<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub stock_level: StockLevel,
    pub image: Option<String>,
    pub status: ProductStatus,
    pub categories: Vec<CategoryResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductResponse {
    pub fn from_parts(product: Product, categories: Vec<Category>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            sku: product.sku,
            description: product.description,
            price: product.price,
            stock: product.stock,
            stock_level: StockLevel::classify(product.stock),
            image: product.image,
            status: product.status,
            categories: categories.into_iter().map(CategoryResponse::from).collect(),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Listing parameters ====================

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub status: Option<ProductStatus>,
    pub low_stock: Option<bool>,
    /// Free-text search over name and sku.
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Whitelisted sort keys; anything else is a validation error rather than
/// raw input reaching the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Sku,
    Price,
    Stock,
    CreatedAt,
}

impl SortBy {
    pub fn parse(input: Option<&str>) -> Result<Self, AppError> {
        match input {
            None => Ok(SortBy::Name),
            Some("name") => Ok(SortBy::Name),
            Some("sku") => Ok(SortBy::Sku),
            Some("price") => Ok(SortBy::Price),
            Some("stock") => Ok(SortBy::Stock),
            Some("created_at") => Ok(SortBy::CreatedAt),
            Some(other) => Err(AppError::validation(
                "sort",
                format!("unknown sort key '{other}'"),
            )),
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Sku => "sku",
            SortBy::Price => "price",
            SortBy::Stock => "stock",
            SortBy::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(input: Option<&str>) -> Result<Self, AppError> {
        match input {
            None | Some("asc") => Ok(SortOrder::Asc),
            Some("desc") => Ok(SortOrder::Desc),
            Some(other) => Err(AppError::validation(
                "order",
                format!("unknown sort order '{other}'"),
            )),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn product_response_carries_stock_level_and_rfc3339_timestamps() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let product = Product {
            id: 1,
            name: "Blue Widget".into(),
            sku: "BW-001".into(),
            description: None,
            price: Decimal::new(1999, 2),
            stock: 3,
            image: None,
            status: ProductStatus::Active,
            created_at: created,
            updated_at: created,
        };
        let categories = vec![Category {
            id: 7,
            name: "Tools".into(),
        }];

        let json = serde_json::to_value(ProductResponse::from_parts(product, categories)).unwrap();
        assert_eq!(json["stock_level"], "critical");
        assert_eq!(json["status"], "active");
        assert_eq!(json["price"], "19.99");
        assert_eq!(json["categories"][0]["name"], "Tools");
        assert_eq!(json["created_at"], "2025-03-01T12:00:00+00:00");
    }

    #[test]
    fn sort_defaults_to_name_ascending() {
        assert_eq!(SortBy::parse(None).unwrap(), SortBy::Name);
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Asc);
    }

    #[test]
    fn all_sortable_columns_parse() {
        for (key, column) in [
            ("name", "name"),
            ("sku", "sku"),
            ("price", "price"),
            ("stock", "stock"),
            ("created_at", "created_at"),
        ] {
            assert_eq!(SortBy::parse(Some(key)).unwrap().column(), column);
        }
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let err = SortBy::parse(Some("id; DROP TABLE products")).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "sort"));
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        let err = SortOrder::parse(Some("sideways")).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "order"));
    }
}
