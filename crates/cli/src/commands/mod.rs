//! Command implementations.
//!
//! Every command takes the injected [`Shop`](crate::shop::Shop) and writes its
//! result to the given output.

pub mod admin;
pub mod auth;
pub mod catalog;

use sweet_shop_core::Price;

/// Parse a non-negative price argument.
///
/// # Errors
///
/// Returns a message clap shows next to the offending argument.
pub fn parse_price(raw: &str) -> Result<Price, String> {
    let price: Price = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a valid price"))?;
    if price.amount().is_sign_negative() {
        return Err("price cannot be negative".to_owned());
    }
    Ok(price)
}
