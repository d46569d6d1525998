//! Sweet Shop client core.
//!
//! The state layer a storefront/admin front end talks to. Front ends render
//! store snapshots and dispatch user intents into the stores; the stores call
//! the remote service through the gateways.
//!
//! # Architecture
//!
//! ```text
//! front end -> InventoryStore / SessionStore -> gateway -> remote service
//!     ^                    |
//!     +---- watch channel -+   (re-render on every state change)
//! ```
//!
//! - [`gateway`] - One request/response exchange per operation; no state
//! - [`inventory`] - Cached catalog plus purchase/restock/admin mutations
//! - [`session`] - Authenticated identity, token and role
//! - [`persistence`] - Where the session survives restarts
//!
//! Stores are plain values, generic over their gateway (and persistence), so
//! front ends receive them by injection and tests substitute in-memory
//! doubles.
//!
//! # Example
//!
//! ```rust,ignore
//! use sweet_shop_client::{ApiClient, ClientConfig, FilePersistence, HttpCatalogGateway,
//!     HttpIdentityGateway, InventoryStore, SessionStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//! let session = SessionStore::new(
//!     HttpIdentityGateway::new(api.clone()),
//!     FilePersistence::new(&config.session_file),
//! );
//! let inventory = InventoryStore::new(HttpCatalogGateway::new(api, session.token_source()));
//!
//! inventory.fetch_all().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod persistence;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, StoreError};
pub use gateway::{
    Anonymous, ApiClient, CatalogGateway, HttpCatalogGateway, HttpIdentityGateway,
    IdentityGateway, TokenSource,
};
pub use inventory::{InventoryState, InventoryStore};
pub use persistence::{FilePersistence, MemoryPersistence, PersistenceError, SessionPersistence};
pub use session::{SessionState, SessionStore, SessionTokens};
