use crate::Result;
use httproute_controller_core::ResourceId;
use httproute_controller_k8s_api::{NamespaceResourceScope, Resource};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Namespaced resources the reconciler reads and writes.
pub trait Object:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> Object for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Access to the cluster's object store.
///
/// Every call is a single request; implementations do not retry. Writes that
/// lose an optimistic concurrency check fail with [`crate::Error::Conflict`].
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Fetches an object, returning `None` if it does not exist.
    async fn get<K: Object>(&self, id: &ResourceId) -> Result<Option<K>>;

    /// Lists objects in all namespaces matching a label selector.
    async fn list<K: Object>(&self, label_selector: &str) -> Result<Vec<K>>;

    async fn create<K: Object>(&self, obj: &K) -> Result<K>;

    /// Replaces an object. The object's resource version must match the
    /// stored version.
    async fn replace<K: Object>(&self, obj: &K) -> Result<K>;

    /// Deletes an object, returning `false` if it did not exist.
    async fn delete<K: Object>(&self, id: &ResourceId) -> Result<bool>;

    /// Applies a JSON patch. Returns `None` if the object does not exist.
    async fn patch<K: Object>(&self, id: &ResourceId, patch: json_patch::Patch)
        -> Result<Option<K>>;
}
