//! Inventory management commands.
//!
//! # Usage
//!
//! ```bash
//! sweet-shop add -n "Sour Worms" -c Gummies -p 1.99 -q 40
//! sweet-shop edit 3 --price 2.25 --description "Now extra sour"
//! sweet-shop restock 3 -q 25
//! sweet-shop delete 3
//! ```
//!
//! All of these need an admin session; the service rejects them otherwise.

use std::io::Write;
use std::num::NonZeroU32;

use clap::Args;
use sweet_shop_client::{CatalogGateway, IdentityGateway, SessionPersistence};
use sweet_shop_core::{Price, SweetDraft, SweetId};

use super::parse_price;
use crate::error::CliError;
use crate::render;
use crate::shop::Shop;

/// Field changes for `edit`. Absent fields keep the stored value.
#[derive(Debug, Default, Args)]
pub struct SweetEdit {
    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long, value_parser = parse_price)]
    pub price: Option<Price>,

    /// Absolute stock level (use `restock` to add to it)
    #[arg(short, long)]
    pub quantity: Option<u32>,

    #[arg(short, long)]
    pub description: Option<String>,
}

impl SweetEdit {
    /// Apply the changes on top of an existing draft.
    #[must_use]
    pub fn apply(self, mut draft: SweetDraft) -> SweetDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(quantity) = self.quantity {
            draft.quantity = quantity;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        draft
    }
}

/// Create a sweet.
///
/// # Errors
///
/// Returns a gate error for non-admin sessions, or the store's error.
pub async fn add<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    draft: &SweetDraft,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_admin()?;
    let sweet = shop.inventory.create(draft).await?;
    tracing::info!(id = %sweet.id, name = %sweet.name, "Sweet added");
    render::sweet(out, &sweet)?;
    Ok(())
}

/// Fetch a sweet, merge `changes` over it, and send the full record back.
///
/// # Errors
///
/// Returns a gate error for non-admin sessions, or the store's error.
pub async fn edit<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    id: SweetId,
    changes: SweetEdit,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_admin()?;
    let current = shop.inventory.get(id).await?;
    let draft = changes.apply(current.to_draft());
    let sweet = shop.inventory.update(id, &draft).await?;
    tracing::info!(id = %id, "Sweet updated");
    render::sweet(out, &sweet)?;
    Ok(())
}

/// Delete a sweet.
///
/// # Errors
///
/// Returns a gate error for non-admin sessions, or the store's error.
pub async fn delete<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    id: SweetId,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_admin()?;
    shop.inventory.delete(id).await?;
    tracing::info!(id = %id, "Sweet deleted");
    writeln!(out, "Deleted sweet #{id}.")?;
    Ok(())
}

/// Add stock to a sweet.
///
/// # Errors
///
/// Returns a gate error for non-admin sessions, or the store's error.
pub async fn restock<C, I, P>(
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
    shop.require_admin()?;
    let sweet = shop.inventory.restock(id, quantity).await?;
    tracing::info!(id = %id, quantity = quantity.get(), "Sweet restocked");
    writeln!(out, "Restocked {}. {} in stock.", sweet.name, sweet.quantity)?;
    Ok(())
}
