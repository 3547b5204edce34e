//! Cart commands.
//!
//! Raw arguments are validated here before they reach the cart store:
//! quantities are floored to whole numbers and prices must be non-negative
//! decimals.

use rust_decimal::Decimal;
use storefront_state::{AppError, AppState, CartSummary};
use storefront_state_core::{CartItem, ProductId, format_price, parse_quantity};
use tracing::{info, warn};

/// Raw input for `cart add`.
#[derive(Debug)]
pub struct AddInput {
    pub id: String,
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Add an item and wait for its image lookup, if one was started.
///
/// # Errors
///
/// Returns an error if the price or quantity is invalid.
pub async fn add(state: &AppState, input: AddInput) -> Result<(), AppError> {
    let item = build_item(input)?;
    if let Some(enrichment) = state.cart().add_item(item) {
        if let Err(e) = enrichment.await {
            warn!(error = %e, "Image lookup task did not complete");
        }
    }

    log_summary(&state.cart().summary());
    Ok(())
}

/// Remove a line.
pub fn remove(state: &AppState, id: &str) {
    if state.cart().remove_item(&ProductId::new(id)) {
        info!(product_id = id, "Removed from cart");
    } else {
        info!(product_id = id, "Not in cart, nothing to remove");
    }
    log_summary(&state.cart().summary());
}

/// Set a line's quantity exactly.
///
/// # Errors
///
/// Returns an error if the quantity is not a number.
pub fn update(state: &AppState, id: &str, quantity: &str) -> Result<(), AppError> {
    let quantity = parse_quantity(quantity)?;
    if !state.cart().update_quantity(&ProductId::new(id), quantity) {
        info!(product_id = id, "Cart unchanged");
    }
    log_summary(&state.cart().summary());
    Ok(())
}

/// Remove every line.
pub fn clear(state: &AppState) {
    state.cart().clear();
    log_summary(&state.cart().summary());
}

/// Show lines and totals.
pub fn show(state: &AppState) {
    log_summary(&state.cart().summary());
}

fn log_summary(summary: &CartSummary) {
    if summary.items.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in &summary.items {
        info!(
            "{:>3} x {} ({}) @ {} = {}{}",
            item.quantity,
            item.name,
            item.id,
            format_price(item.unit_price),
            format_price(item.line_total()),
            if item.has_image() { " [image]" } else { "" }
        );
    }
    info!(
        "{} item(s), total {}",
        summary.total_items,
        summary.formatted_total()
    );
}

fn build_item(input: AddInput) -> Result<CartItem, AppError> {
    let quantity = parse_positive_quantity(&input.quantity)?;
    let unit_price = parse_price(&input.price)?;

    let mut item = CartItem::new(input.id, input.name, unit_price, quantity);
    item.category = input.category;
    item.subcategory = input.subcategory;

    if item.checked_line_total().is_none() {
        return Err(AppError::BadRequest(format!(
            "line total of {quantity} x {unit_price} is too large"
        )));
    }
    Ok(item)
}

fn parse_positive_quantity(raw: &str) -> Result<u32, AppError> {
    let quantity = parse_quantity(raw)?;
    u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| AppError::BadRequest(format!("quantity must be positive, got {quantity}")))
}

fn parse_price(raw: &str) -> Result<Decimal, AppError> {
    let price: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid price: {raw:?}")))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::BadRequest(format!("price cannot be negative: {raw}")));
    }
    Ok(price)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_quantity_floors() {
        assert_eq!(parse_positive_quantity("2.7").unwrap(), 2);
    }

    #[test]
    fn test_parse_positive_quantity_rejects_zero_and_negative() {
        assert!(matches!(
            parse_positive_quantity("0.5"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_positive_quantity("-3"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_positive_quantity("lots"),
            Err(AppError::Quantity(_))
        ));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("19.99").unwrap(), Decimal::new(1999, 2));
        assert_eq!(parse_price("0").unwrap(), Decimal::ZERO);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("free").is_err());
    }

    fn input(price: &str, quantity: &str) -> AddInput {
        AddInput {
            id: "p1".to_string(),
            name: "Pineapple".to_string(),
            price: price.to_string(),
            quantity: quantity.to_string(),
            category: Some("fruit".to_string()),
            subcategory: None,
        }
    }

    #[test]
    fn test_build_item() {
        let item = build_item(input("2.50", "3.9")).unwrap();
        assert_eq!(item.quantity, 3);
        assert_eq!(item.unit_price, Decimal::new(250, 2));
        assert_eq!(item.category.as_deref(), Some("fruit"));
    }

    #[test]
    fn test_build_item_rejects_overflowing_line_total() {
        assert!(build_item(input("79228162514264337593543950335", "1")).is_ok());
        assert!(matches!(
            build_item(input("79228162514264337593543950335", "2")),
            Err(AppError::BadRequest(_))
        ));
    }
}
