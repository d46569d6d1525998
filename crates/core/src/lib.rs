//! Sweet Shop Core - Shared types library.
//!
//! This crate provides the types shared by every Sweet Shop component:
//! - `client` - Remote gateways plus the session and inventory stores
//! - `cli` - Terminal storefront and administration front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere,
//! including in test doubles of the remote service.
//!
//! # Modules
//!
//! - [`types`] - Catalog records, search filters, roles, session identities
//!   and operation status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
