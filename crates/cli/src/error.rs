//! CLI error type.

use std::io;

use sweet_shop_client::{ApiError, ConfigError, StoreError};
use thiserror::Error;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be created.
    #[error("Client setup failed: {0}")]
    Client(#[from] ApiError),

    /// A store operation failed; displays the store's message followed by
    /// any per-field validation messages.
    #[error("{}", describe_store(.0))]
    Store(#[from] StoreError),

    /// The command needs a signed-in session.
    #[error("You need to sign in first (sweet-shop login)")]
    NotAuthenticated,

    /// The command needs an admin session.
    #[error("This action requires an admin account")]
    Forbidden,

    /// Admin accounts manage stock rather than buy it.
    #[error("Purchases are made from customer accounts")]
    AdminPurchase,

    /// Login/register while a session exists.
    #[error("Already signed in as {0}; sign out first (sweet-shop logout)")]
    AlreadySignedIn(String),

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

fn describe_store(err: &StoreError) -> String {
    let mut lines = vec![err.message().to_owned()];
    if let Some(fields) = err.field_errors() {
        lines.extend(fields.iter().map(|(field, message)| format!("  {field}: {message}")));
    }
    lines.join("\n")
}
