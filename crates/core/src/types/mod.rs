//! Core types for the Sweet Shop.
//!
//! This module provides type-safe wrappers for the catalog and session domain.

pub mod auth;
pub mod id;
pub mod price;
pub mod status;
pub mod sweet;

pub use auth::{Credentials, Registration, Role, SessionIdentity};
pub use id::*;
pub use price::Price;
pub use status::OperationStatus;
pub use sweet::{SearchFilter, Sweet, SweetDraft};
