//! Error types for the vision worker

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("queue transport error: {0}")]
    QueueTransport(#[source] reqwest::Error),

    #[error("queue rejected request ({kind}): {message}")]
    QueueApi { kind: String, message: String },

    #[error("failed to fetch object {key}")]
    Fetch {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("object not found: {bucket}/{key}")]
    ObjectMissing { bucket: String, key: String },

    #[error("object store returned HTTP {status} for {key}")]
    ObjectStatus { key: String, status: u16 },

    #[error("malformed message body: {0}")]
    MalformedMessage(String),

    #[error("failed to load model from {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unsupported or corrupt image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file system error")]
    Fs(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
