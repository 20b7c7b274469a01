//! HTTP object store client (path-style, S3-compatible)

use crate::error::{Result, WorkerError};
use crate::queue::ObjectReference;
use crate::store::ObjectStore;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct HttpObjectStoreConfig {
    /// Store endpoint, e.g. `http://localhost:9000`
    pub endpoint: String,

    /// Connection timeout (default: 10 seconds)
    pub connect_timeout: Duration,

    /// Request timeout (default: 60 seconds)
    pub request_timeout: Duration,
}

impl Default for HttpObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Object store client using path-style addressing
/// (`{endpoint}/{bucket}/{key}`).
pub struct HttpObjectStore {
    client: Client,
    config: HttpObjectStoreConfig,
}

impl HttpObjectStore {
    pub fn new(config: HttpObjectStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WorkerError::Fetch {
                key: "client_init".to_string(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    fn object_url(&self, reference: &ObjectReference) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            reference.bucket,
            reference.key
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, reference: &ObjectReference) -> Result<Vec<u8>> {
        let url = self.object_url(reference);
        debug!("Downloading {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::Fetch {
                key: reference.key.clone(),
                source: e,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WorkerError::ObjectMissing {
                bucket: reference.bucket.clone(),
                key: reference.key.clone(),
            });
        }
        if !status.is_success() {
            return Err(WorkerError::ObjectStatus {
                key: reference.key.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| WorkerError::Fetch {
            key: reference.key.clone(),
            source: e,
        })?;

        debug!("Downloaded {} bytes for {}", bytes.len(), reference.key);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_endpoint(endpoint: &str) -> HttpObjectStore {
        HttpObjectStore::new(HttpObjectStoreConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_object_url_is_path_style() {
        let store = store_with_endpoint("http://localhost:9000");
        let reference = ObjectReference {
            bucket: "uploads".to_string(),
            key: "cat.jpg".to_string(),
        };
        assert_eq!(store.object_url(&reference), "http://localhost:9000/uploads/cat.jpg");
    }

    #[test]
    fn test_object_url_tolerates_trailing_slash() {
        let store = store_with_endpoint("http://localhost:9000/");
        let reference = ObjectReference {
            bucket: "uploads".to_string(),
            key: "nested/dog.png".to_string(),
        };
        assert_eq!(
            store.object_url(&reference),
            "http://localhost:9000/uploads/nested/dog.png"
        );
    }
}
