//! Cart line item.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A single line in the shopping cart.
///
/// The persisted JSON shape uses camelCase keys (`unitPrice`) and omits
/// absent optional fields. `unitPrice` is written as a string to preserve
/// decimal precision, and read back from either a string or a number.
///
/// ## Constraints
///
/// - `id` is unique within a cart
/// - `quantity` is always greater than zero while the item is in a cart
/// - `unit_price` is non-negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line refers to.
    pub id: ProductId,
    /// Display label, possibly stale relative to the backend.
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Embedded visual asset (opaque encoded payload), populated lazily.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl CartItem {
    /// Create a cart item without image or classification.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
            image: None,
            category: None,
            subcategory: None,
        }
    }

    /// Attach an embedded image payload.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Attach a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a subcategory.
    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Price of the whole line (`unit_price × quantity`).
    ///
    /// Saturates at [`Decimal::MAX`]; use
    /// [`checked_line_total`](Self::checked_line_total) to detect overflow.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Price of the whole line, `None` if it is not representable.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }

    /// Whether the price is usable in a cart: not negative.
    #[must_use]
    pub fn has_valid_price(&self) -> bool {
        self.unit_price >= Decimal::ZERO
    }

    /// Whether the item carries an embedded image.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = CartItem::new("p1", "Pineapple", Decimal::new(250, 2), 4);
        assert_eq!(item.line_total(), Decimal::new(10, 0));
        assert_eq!(item.checked_line_total(), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn test_line_total_overflow() {
        let item = CartItem::new("p1", "Pineapple", Decimal::MAX, 2);
        assert_eq!(item.checked_line_total(), None);
        assert_eq!(item.line_total(), Decimal::MAX);
    }

    #[test]
    fn test_has_valid_price() {
        assert!(CartItem::new("p1", "A", Decimal::ZERO, 1).has_valid_price());
        assert!(!CartItem::new("p1", "A", Decimal::new(-5, 0), 1).has_valid_price());
    }

    #[test]
    fn test_serializes_camel_case_without_absent_fields() {
        let item = CartItem::new("p1", "Pineapple", Decimal::new(10, 0), 2);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["id"], "p1");
        assert_eq!(json["unitPrice"], "10");
        assert_eq!(json["quantity"], 2);
        assert!(json.get("image").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_deserializes_numeric_price_and_optional_fields() {
        let json = r#"{"id":"p2","name":"Mango","unitPrice":3.5,"quantity":1,"category":"fruit"}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.unit_price, Decimal::new(35, 1));
        assert_eq!(item.category.as_deref(), Some("fruit"));
        assert!(item.subcategory.is_none());
        assert!(!item.has_image());
    }

    #[test]
    fn test_rejects_negative_quantity() {
        let json = r#"{"id":"p3","name":"Kiwi","unitPrice":"1","quantity":-1}"#;
        assert!(serde_json::from_str::<CartItem>(json).is_err());
    }
}
