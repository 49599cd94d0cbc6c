use std::sync::Arc;

use thiserror::Error;

/// Durable store operation error.
///
/// These are **infrastructure errors**; the cart manager reports them as
/// persistence failures and keeps the previous cart.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),
}

/// Key-value persistence surface.
///
/// Values are opaque serialized blobs. A `write` either fully replaces the
/// value under `key` or fails without changing it.
#[async_trait::async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the blob stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the blob stored under `key`.
    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> DurableStore for Arc<S>
where
    S: DurableStore + ?Sized,
{
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        (**self).write(key, blob).await
    }
}
