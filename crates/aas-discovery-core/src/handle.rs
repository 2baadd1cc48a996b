//! Async access for request handlers running on tokio.
//!
//! Store calls may block on disk or database I/O, so every operation is
//! moved onto the blocking thread pool.

use crate::error::{DiscoveryError, Result};
use crate::model::{AssetLink, DeleteOutcome, RegisterOutcome, SearchPage, SearchRequest};
use crate::service::DiscoveryService;
use crate::store::DescriptorStore;
use std::sync::Arc;

/// Cloneable async handle to a [`DiscoveryService`].
#[derive(Debug)]
pub struct DiscoveryHandle<S> {
    service: Arc<DiscoveryService<S>>,
}

impl<S> Clone for DiscoveryHandle<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: DescriptorStore + 'static> DiscoveryHandle<S> {
    /// Wrap a service for shared async use.
    #[must_use]
    pub fn new(service: DiscoveryService<S>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// The wrapped service, for synchronous callers.
    #[must_use]
    pub fn service(&self) -> &DiscoveryService<S> {
        &self.service
    }

    /// See [`DiscoveryService::register`].
    ///
    /// # Errors
    ///
    /// Returns the service error, or `Storage` if the blocking task failed.
    pub async fn register(
        &self,
        aas_id: String,
        links: Vec<AssetLink>,
    ) -> Result<RegisterOutcome> {
        self.run(move |service| service.register(&aas_id, links)).await
    }

    /// See [`DiscoveryService::fetch`].
    ///
    /// # Errors
    ///
    /// Returns the service error, or `Storage` if the blocking task failed.
    pub async fn fetch(&self, aas_id: String) -> Result<Vec<AssetLink>> {
        self.run(move |service| service.fetch(&aas_id)).await
    }

    /// See [`DiscoveryService::delete`].
    ///
    /// # Errors
    ///
    /// Returns the service error, or `Storage` if the blocking task failed.
    pub async fn delete(&self, aas_id: String) -> Result<DeleteOutcome> {
        self.run(move |service| service.delete(&aas_id)).await
    }

    /// See [`DiscoveryService::search_request`].
    ///
    /// # Errors
    ///
    /// Returns the service error, or `Storage` if the blocking task failed.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchPage> {
        self.run(move |service| service.search_request(&request)).await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DiscoveryService<S>) -> Result<T> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || op(&*service))
            .await
            .map_err(|e| DiscoveryError::storage(format!("blocking task failed: {e}")))?
    }
}
