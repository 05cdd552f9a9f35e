//! Discount arithmetic for offer confirmation.
//!
//! Prices travel as text with a comma decimal separator ("1234,50"). Nothing
//! here ever fails: a price that does not parse renders as [`NOT_AVAILABLE`],
//! and a discount that does not parse counts as no discount.

/// Rendered in place of a price that could not be computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// Parses a locale-formatted decimal. Non-finite values are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Discount percentage, or `0.0` when the text is not a number.
pub fn parse_discount(text: &str) -> f64 {
    parse_decimal(text).unwrap_or(0.0)
}

/// Renders with two decimals and a comma separator.
pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value).replace('.', ",")
}

/// Applies an already-parsed discount percentage to a base price.
fn discounted_price(base_price: &str, discount_percent: f64) -> String {
    match parse_decimal(base_price) {
        Some(price) => format_decimal(price * (1.0 - discount_percent / 100.0)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `base * (1 - discount / 100)`, or [`NOT_AVAILABLE`] for a bad base price.
pub fn apply_discount(base_price: &str, discount_percent: &str) -> String {
    discounted_price(base_price, parse_discount(discount_percent))
}
