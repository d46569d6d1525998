//! Remote gateways.
//!
//! Each gateway method is exactly one request/response exchange with the
//! remote service. Gateways hold no state of their own; the stores decide
//! what to do with the result.
//!
//! The traits are the seam the stores are generic over, so tests can swap in
//! in-memory doubles. [`HttpCatalogGateway`] and [`HttpIdentityGateway`] are
//! the `reqwest` implementations.

mod catalog;
mod http;
mod identity;

use std::future::Future;
use std::num::NonZeroU32;

use secrecy::SecretString;
use sweet_shop_core::{Credentials, Registration, SearchFilter, SessionIdentity, Sweet, SweetDraft, SweetId};

pub use catalog::HttpCatalogGateway;
pub use http::ApiClient;
pub use identity::HttpIdentityGateway;

use crate::error::ApiError;

/// Catalog endpoints of the remote service.
pub trait CatalogGateway: Send + Sync {
    /// `GET /sweets`
    fn list(&self) -> impl Future<Output = Result<Vec<Sweet>, ApiError>> + Send;

    /// `GET /sweets/search`
    fn search(
        &self,
        filter: &SearchFilter,
    ) -> impl Future<Output = Result<Vec<Sweet>, ApiError>> + Send;

    /// `GET /sweets/{id}`
    fn get(&self, id: SweetId) -> impl Future<Output = Result<Sweet, ApiError>> + Send;

    /// `POST /sweets`
    fn create(&self, draft: &SweetDraft) -> impl Future<Output = Result<Sweet, ApiError>> + Send;

    /// `PUT /sweets/{id}`
    fn update(
        &self,
        id: SweetId,
        draft: &SweetDraft,
    ) -> impl Future<Output = Result<Sweet, ApiError>> + Send;

    /// `DELETE /sweets/{id}`
    fn delete(&self, id: SweetId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /sweets/{id}/purchase`; returns the record after the decrement.
    fn purchase(
        &self,
        id: SweetId,
        quantity: NonZeroU32,
    ) -> impl Future<Output = Result<Sweet, ApiError>> + Send;

    /// `POST /sweets/{id}/restock`; returns the record after the increment.
    fn restock(
        &self,
        id: SweetId,
        quantity: NonZeroU32,
    ) -> impl Future<Output = Result<Sweet, ApiError>> + Send;
}

/// Identity endpoints of the remote service.
pub trait IdentityGateway: Send + Sync {
    /// `POST /auth/register`
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<SessionIdentity, ApiError>> + Send;

    /// `POST /auth/login`
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SessionIdentity, ApiError>> + Send;
}

/// Supplies the bearer token attached to catalog requests.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Token source for anonymous browsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }
}

impl TokenSource for SecretString {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.clone())
    }
}
