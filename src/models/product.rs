use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stock strictly below this value raises the low-stock alert and the
/// `low_stock` list filter.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Stock strictly below this value (but at or above the alert threshold)
/// is reported as "low" rather than "critical".
pub const STOCK_WARNING_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived stock classification shown in product listings. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Critical,
    Low,
    Healthy,
}

impl StockLevel {
    pub fn classify(stock: i32) -> Self {
        if stock < LOW_STOCK_THRESHOLD {
            StockLevel::Critical
        } else if stock < STOCK_WARNING_THRESHOLD {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_below_five_is_critical() {
        assert_eq!(StockLevel::classify(0), StockLevel::Critical);
        assert_eq!(StockLevel::classify(4), StockLevel::Critical);
    }

    #[test]
    fn stock_between_five_and_ten_is_low() {
        assert_eq!(StockLevel::classify(5), StockLevel::Low);
        assert_eq!(StockLevel::classify(9), StockLevel::Low);
    }

    #[test]
    fn stock_at_ten_or_more_is_healthy() {
        assert_eq!(StockLevel::classify(10), StockLevel::Healthy);
        assert_eq!(StockLevel::classify(500), StockLevel::Healthy);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&ProductStatus::Inactive).unwrap(),
            "\"inactive\""
        );
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(serde_json::from_str::<ProductStatus>("\"archived\"").is_err());
    }
}
