//! Lazily constructed, resettable provider client

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Holds at most one client.
///
/// Concurrent first callers share a single initialization. A failed
/// initialization leaves the slot empty so the next caller tries again.
pub struct ProviderSlot<T> {
    cell: RwLock<Arc<OnceCell<Arc<T>>>>,
}

impl<T> ProviderSlot<T> {
    pub fn new() -> Self {
        Self {
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    /// Return the client, constructing it with `init` if the slot is empty
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.cell.read().clone();
        cell.get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// The current client, if one has been constructed
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.read().get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.read().initialized()
    }

    /// Empty the slot, returning the client it held.
    ///
    /// Callers already holding the old client keep using it.
    pub fn reset(&self) -> Option<Arc<T>> {
        let previous = std::mem::replace(&mut *self.cell.write(), Arc::new(OnceCell::new()));
        previous.get().cloned()
    }
}

impl<T> Default for ProviderSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
