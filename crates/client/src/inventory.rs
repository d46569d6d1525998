//! Inventory state store.
//!
//! Local cache of the server-authoritative catalog. Every operation is one
//! round trip through the [`CatalogGateway`], after which the cache is
//! reconciled with the server's answer, never with a locally predicted value:
//!
//! - `fetch_all`/`search` replace the whole collection
//! - `create` appends the created record
//! - `update`/`purchase`/`restock` replace the record with the same id
//! - `delete` removes the record with that id
//!
//! Updates for ids that are not cached are ignored; the server decides what
//! exists. A failed call leaves the cache exactly as it was.
//!
//! # Concurrency
//!
//! Operations take `&self` and may overlap. Nothing is queued, fenced or
//! cancelled: each call applies its own response when it arrives, so the last
//! response to land wins, and the last call to settle decides `pending` and
//! `last_error`.

use std::future::Future;
use std::num::NonZeroU32;

use sweet_shop_core::{OperationStatus, SearchFilter, Sweet, SweetDraft, SweetId};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{ApiError, StoreError};
use crate::gateway::CatalogGateway;

/// Snapshot of the inventory store.
#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    /// The cached catalog, in server order.
    pub sweets: Vec<Sweet>,
    /// Record loaded by [`InventoryStore::get`], e.g. for a detail view.
    pub selected: Option<Sweet>,
    pub status: OperationStatus,
}

impl InventoryState {
    #[must_use]
    pub fn find(&self, id: SweetId) -> Option<&Sweet> {
        self.sweets.iter().find(|sweet| sweet.id == id)
    }

    /// Replace the cached copies of `sweet` (collection entry and selection).
    fn replace(&mut self, sweet: &Sweet) {
        if let Some(slot) = self.sweets.iter_mut().find(|s| s.id == sweet.id) {
            slot.clone_from(sweet);
        }
        if let Some(selected) = self.selected.as_mut().filter(|s| s.id == sweet.id) {
            selected.clone_from(sweet);
        }
    }

    fn remove(&mut self, id: SweetId) {
        self.sweets.retain(|sweet| sweet.id != id);
        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = None;
        }
    }
}

/// Owner of the cached catalog.
///
/// Every state change is published to [`InventoryStore::subscribe`] receivers.
pub struct InventoryStore<G> {
    gateway: G,
    state: watch::Sender<InventoryState>,
}

impl<G: CatalogGateway> InventoryStore<G> {
    pub fn new(gateway: G) -> Self {
        let (state, _) = watch::channel(InventoryState::default());
        Self { gateway, state }
    }

    /// Replace the collection with the server's full catalog.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to fetch sweets" unless the server says
    /// otherwise); the previous collection is kept.
    pub async fn fetch_all(&self) -> Result<Vec<Sweet>, StoreError> {
        self.execute("fetch_all", "Failed to fetch sweets", self.gateway.list(), |state, sweets| {
            state.sweets.clone_from(sweets);
        })
        .await
    }

    /// Replace the collection with the server's search result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Search failed" unless the server says
    /// otherwise); the previous collection is kept.
    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<Sweet>, StoreError> {
        self.execute("search", "Search failed", self.gateway.search(filter), |state, sweets| {
            state.sweets.clone_from(sweets);
        })
        .await
    }

    /// Load one record into the selection. The collection is not touched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to fetch sweet" unless the server says
    /// otherwise); the previous selection is kept.
    pub async fn get(&self, id: SweetId) -> Result<Sweet, StoreError> {
        self.execute("get", "Failed to fetch sweet", self.gateway.get(id), |state, sweet| {
            state.selected = Some(sweet.clone());
        })
        .await
    }

    /// Create a record and append the server's copy to the collection.
    ///
    /// Callers are expected to have checked that the session is an admin.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to add sweet" unless the server says
    /// otherwise).
    pub async fn create(&self, draft: &SweetDraft) -> Result<Sweet, StoreError> {
        self.execute("create", "Failed to add sweet", self.gateway.create(draft), |state, sweet| {
            state.sweets.push(sweet.clone());
        })
        .await
    }

    /// Update a record and replace the cached entry with the server's copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to update sweet" unless the server says
    /// otherwise).
    pub async fn update(&self, id: SweetId, draft: &SweetDraft) -> Result<Sweet, StoreError> {
        self.execute(
            "update",
            "Failed to update sweet",
            self.gateway.update(id, draft),
            InventoryState::replace,
        )
        .await
    }

    /// Delete a record and drop it from the cache.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to delete sweet" unless the server says
    /// otherwise); the record stays cached.
    pub async fn delete(&self, id: SweetId) -> Result<(), StoreError> {
        self.execute("delete", "Failed to delete sweet", self.gateway.delete(id), |state, _| {
            state.remove(id);
        })
        .await
    }

    /// Buy `quantity` units. The server checks stock and decrements it; the
    /// cached record becomes the server's post-purchase copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` (e.g. insufficient stock); the cached record is
    /// unchanged.
    pub async fn purchase(&self, id: SweetId, quantity: NonZeroU32) -> Result<Sweet, StoreError> {
        self.execute(
            "purchase",
            "Failed to purchase sweet",
            self.gateway.purchase(id, quantity),
            InventoryState::replace,
        )
        .await
    }

    /// Add `quantity` units. The cached record becomes the server's
    /// post-restock copy.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` ("Failed to restock sweet" unless the server says
    /// otherwise); the cached record is unchanged.
    pub async fn restock(&self, id: SweetId, quantity: NonZeroU32) -> Result<Sweet, StoreError> {
        self.execute(
            "restock",
            "Failed to restock sweet",
            self.gateway.restock(id, quantity),
            InventoryState::replace,
        )
        .await
    }

    /// Set or clear the selection without a round trip.
    pub fn select(&self, sweet: Option<Sweet>) {
        self.state.send_modify(|state| state.selected = sweet);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.status.clear_error());
    }

    /// The cached collection.
    #[must_use]
    pub fn sweets(&self) -> Vec<Sweet> {
        self.state.borrow().sweets.clone()
    }

    /// The cached copy of one record.
    #[must_use]
    pub fn find(&self, id: SweetId) -> Option<Sweet> {
        self.state.borrow().find(id).cloned()
    }

    #[must_use]
    pub fn selected(&self) -> Option<Sweet> {
        self.state.borrow().selected.clone()
    }

    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.state.borrow().status.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> InventoryState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<InventoryState> {
        self.state.subscribe()
    }

    /// Run one round trip and reconcile the cache with its outcome.
    ///
    /// `apply` runs only on success; on failure the cache is left alone and
    /// the error message is recorded before being returned.
    async fn execute<T>(
        &self,
        operation: &'static str,
        fallback: &'static str,
        request: impl Future<Output = Result<T, ApiError>>,
        apply: impl FnOnce(&mut InventoryState, &T),
    ) -> Result<T, StoreError> {
        self.state.send_modify(|state| state.status.begin());

        match request.await {
            Ok(value) => {
                self.state.send_modify(|state| {
                    apply(state, &value);
                    state.status.succeed();
                });
                debug!(operation, cached = self.state.borrow().sweets.len(), "Inventory updated");
                Ok(value)
            }
            Err(source) => {
                let err = StoreError::new(fallback, source);
                warn!(operation, error = %err.api_error(), "{}", err.message());
                self.state.send_modify(|state| state.status.fail(err.message()));
                Err(err)
            }
        }
    }
}
