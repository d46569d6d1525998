//! Sign-in, registration, and sign-out.

use std::io::Write;

use sweet_shop_client::{CatalogGateway, IdentityGateway, SessionPersistence};
use sweet_shop_core::{Credentials, Registration};

use crate::error::CliError;
use crate::render;
use crate::shop::Shop;

/// Create an account and sign in as it.
///
/// # Errors
///
/// Returns `CliError::AlreadySignedIn` when a session exists, or the store's error.
pub async fn register<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    username: String,
    email: String,
    password: String,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_anonymous()?;

    let identity = shop
        .session
        .register(&Registration::new(username, email, password))
        .await?;
    tracing::info!(username = %identity.username, "Account created");
    render::identity(out, Some(&identity))?;
    Ok(())
}

/// Sign in.
///
/// # Errors
///
/// Returns `CliError::AlreadySignedIn` when a session exists, or the store's error.
pub async fn login<C, I, P>(
    shop: &Shop<C, I, P>,
    out: &mut impl Write,
    username: String,
    password: String,
) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    shop.require_anonymous()?;

    let identity = shop
        .session
        .login(&Credentials::new(username, password))
        .await?;
    render::identity(out, Some(&identity))?;
    Ok(())
}

/// Sign out. Signing out an anonymous session is not an error.
///
/// # Errors
///
/// Returns `CliError::Io` if the confirmation cannot be written.
pub fn logout<C, I, P>(shop: &Shop<C, I, P>, out: &mut impl Write) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    let was = shop.session.identity();
    shop.session.logout();
    match was {
        Some(identity) => writeln!(out, "Signed out {}.", identity.username)?,
        None => writeln!(out, "Not signed in.")?,
    }
    Ok(())
}

/// Show the stored session.
///
/// # Errors
///
/// Returns `CliError::Io` if the output cannot be written.
pub fn whoami<C, I, P>(shop: &Shop<C, I, P>, out: &mut impl Write) -> Result<(), CliError>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    render::identity(out, shop.session.identity().as_ref())?;
    Ok(())
}
