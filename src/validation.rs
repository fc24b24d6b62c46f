// src/validation.rs
//
// Field-level checks shared by the product create and update handlers.
// Uniqueness is NOT checked here: the unique indexes on products.name and
// products.sku are the only defense against concurrent duplicate writes,
// so violations are mapped from the database error instead.
use rust_decimal::Decimal;

use crate::error::AppError;

pub const NAME_MAX_LEN: usize = 255;
pub const SKU_MAX_LEN: usize = 100;

pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "must not be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::validation(
            "name",
            format!("must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_sku(sku: &str) -> Result<(), AppError> {
    if sku.trim().is_empty() {
        return Err(AppError::validation("sku", "must not be empty"));
    }
    if sku.chars().count() > SKU_MAX_LEN {
        return Err(AppError::validation(
            "sku",
            format!("must be at most {SKU_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("price", "cannot be negative"));
    }
    // normalize() drops trailing zeros so "12.50" passes as scale 2
    if price.normalize().scale() > 2 {
        return Err(AppError::validation(
            "price",
            "must have at most 2 decimal places",
        ));
    }
    Ok(())
}

pub fn validate_stock(stock: i32) -> Result<(), AppError> {
    if stock < 0 {
        return Err(AppError::validation("stock", "cannot be negative"));
    }
    Ok(())
}

/// Category name for find-or-create; same length cap as product names.
pub fn validate_category_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "must not be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::validation(
            "name",
            format!("must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(field_of(validate_name("   ").unwrap_err()), "name");
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "x".repeat(NAME_MAX_LEN + 1);
        assert_eq!(field_of(validate_name(&name).unwrap_err()), "name");
        assert!(validate_name(&"x".repeat(NAME_MAX_LEN)).is_ok());
    }

    #[test]
    fn empty_sku_is_rejected() {
        assert_eq!(field_of(validate_sku("").unwrap_err()), "sku");
    }

    #[test]
    fn overlong_sku_is_rejected() {
        let sku = "s".repeat(SKU_MAX_LEN + 1);
        assert_eq!(field_of(validate_sku(&sku).unwrap_err()), "sku");
    }

    #[test]
    fn negative_price_is_rejected() {
        let price = Decimal::from_str("-0.01").unwrap();
        assert_eq!(field_of(validate_price(price).unwrap_err()), "price");
    }

    #[test]
    fn price_with_three_decimals_is_rejected() {
        let price = Decimal::from_str("9.999").unwrap();
        assert_eq!(field_of(validate_price(price).unwrap_err()), "price");
    }

    #[test]
    fn price_with_trailing_zeros_is_accepted() {
        assert!(validate_price(Decimal::from_str("12.500").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("0.00").unwrap()).is_ok());
    }

    #[test]
    fn negative_stock_is_rejected() {
        assert_eq!(field_of(validate_stock(-1).unwrap_err()), "stock");
        assert!(validate_stock(0).is_ok());
    }
}
