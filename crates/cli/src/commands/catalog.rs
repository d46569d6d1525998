//! Browsing and buying.

use std::io::Write;
use std::num::NonZeroU32;

use sweet_shop_client::{CatalogGateway, IdentityGateway, SessionPersistence};
use sweet_shop_core::{Price, SearchFilter, SweetId};

use crate::error::CliError;
use crate::render;
use crate::shop::Shop;

/// Build a search filter from optional command-line fields.
#[must_use]
pub fn filter(
    name: Option<String>,
    category: Option<String>,
    min_price: Option<Price>,
    max_price: Option<Price>,
) -> SearchFilter {
    SearchFilter {
        name,
        category,
        min_price,
        max_price,
    }
}

/// Print the whole catalog.
///
/// # Errors
///
/// Returns `CliError::NotAuthenticated` without a session, or the store's error.
pub async fn list<C, I, P>(shop: &Shop<C, I, P>, out: &mut impl Write) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_authenticated()?;
    let sweets = shop.inventory.fetch_all().await?;
    render::sweets(out, &sweets)?;
    Ok(())
}

/// Print the sweets matching `filter`. An empty filter lists everything.
///
/// # Errors
///
/// Returns `CliError::NotAuthenticated` without a session, or the store's error.
pub async fn search<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    filter: &SearchFilter,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_authenticated()?;
    let sweets = if filter.is_empty() {
        shop.inventory.fetch_all().await?
    } else {
        shop.inventory.search(filter).await?
    };
    render::sweets(out, &sweets)?;
    Ok(())
}

/// Print one sweet.
///
/// # Errors
///
/// Returns `CliError::NotAuthenticated` without a session, or the store's error.
pub async fn show<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    id: SweetId,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_authenticated()?;
    let sweet = shop.inventory.get(id).await?;
    render::sweet(out, &sweet)?;
    Ok(())
}

/// Buy `quantity` of a sweet and print its remaining stock.
///
/// # Errors
///
/// Returns a gate error for anonymous or admin sessions, or the store's error.
pub async fn purchase<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    id: SweetId,
    quantity: NonZeroU32,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_customer()?;
    let sweet = shop.inventory.purchase(id, quantity).await?;
    tracing::info!(id = %id, quantity = quantity.get(), "Purchased");
    writeln!(
        out,
        "Purchased {quantity} x {}. {} left in stock.",
        sweet.name, sweet.quantity
    )?;
    Ok(())
}
