//! Process configuration, loaded once at startup

use crate::error::{Result, WorkerError};
use std::path::PathBuf;

/// Startup configuration for the worker process.
///
/// Everything here is fixed for the life of the process; there is no runtime
/// reconfiguration. Worker-loop tuning lives in [`crate::worker::WorkerConfig`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Queue service endpoint, e.g. `http://localhost:9324`
    pub queue_endpoint: String,

    /// Full queue URL passed in every receive/delete call
    pub queue_url: String,

    /// Object store endpoint, e.g. `http://localhost:9000`
    pub store_endpoint: String,

    /// Bucket holding the images referenced by queue messages
    pub bucket: String,

    /// Path to the ONNX classification model
    pub model_path: PathBuf,

    /// Path to the newline-separated class label file
    pub labels_path: PathBuf,

    /// Directory for transient downloads
    pub scratch_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            queue_endpoint: required_var("QUEUE_ENDPOINT")?,
            queue_url: required_var("QUEUE_URL")?,
            store_endpoint: required_var("OBJECT_STORE_ENDPOINT")?,
            bucket: required_var("OBJECT_STORE_BUCKET")?,
            model_path: optional_path("MODEL_PATH", "models/resnet50.onnx"),
            labels_path: optional_path("LABELS_PATH", "models/imagenet_classes.txt"),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("vision-worker")),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| WorkerError::Config(format!("{} not set", name)))
}

fn optional_path(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
