//! Object store client and scoped download management

pub mod fetcher;
pub mod http;

pub use fetcher::{FetchedObject, ObjectFetcher};
pub use http::{HttpObjectStore, HttpObjectStoreConfig};

use crate::error::Result;
use crate::queue::ObjectReference;
use async_trait::async_trait;

/// Object store port. Production does path-style HTTP GETs; tests swap in an
/// in-memory double.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the referenced object's bytes.
    async fn get(&self, reference: &ObjectReference) -> Result<Vec<u8>>;
}
