use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;

/// Asynchronous key-value backend that stored containers persist into.
///
/// Values are opaque strings. Each individual call is expected to be atomic per
/// key; no ordering is assumed between concurrent calls, and timeouts and
/// retries are left to the implementation.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the entry for `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Adapter that prefixes every key with a namespace.
///
/// Lets several independent sets of containers share one backend without
/// their keys colliding.
pub struct Namespaced {
    inner: Arc<dyn StorageAdapter>,
    prefix: String,
}

impl Namespaced {
    /// Wrap `inner`, storing every key as `"{namespace}:{key}"`.
    pub fn new(inner: Arc<dyn StorageAdapter>, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: namespace.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl StorageAdapter for Namespaced {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(&self.scoped(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn namespaced_keys_do_not_collide() {
        let backend = MemoryStorage::new();
        let alice = Namespaced::new(Arc::new(backend.clone()), "alice");
        let bob = Namespaced::new(Arc::new(backend.clone()), "bob");

        alice.set("cart", "[1]").await.unwrap();
        bob.set("cart", "[2]").await.unwrap();

        assert_eq!(alice.get("cart").await.unwrap().as_deref(), Some("[1]"));
        assert_eq!(bob.get("cart").await.unwrap().as_deref(), Some("[2]"));
        assert_eq!(backend.raw("alice:cart").as_deref(), Some("[1]"));

        alice.remove("cart").await.unwrap();
        assert_eq!(alice.get("cart").await.unwrap(), None);
        assert_eq!(bob.get("cart").await.unwrap().as_deref(), Some("[2]"));
    }
}
