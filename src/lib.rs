//! Vision Worker - a queue-driven image classification service
//!
//! The worker polls a message queue for object-created events, downloads the
//! referenced image from an object store into a scoped temporary file,
//! classifies it with an ONNX model loaded once per process, reports the
//! ranked labels, and deletes the message on success. A message that fails
//! any step is left undeleted and redelivers after its visibility timeout
//! (at-least-once semantics).

pub mod config;
pub mod error;
pub mod inference;
pub mod queue;
pub mod store;
pub mod worker;

pub use config::AppConfig;
pub use error::{Result, WorkerError};
pub use inference::{Classifier, Labels, OnnxClassifier, Prediction, DEFAULT_TOP_K};
pub use queue::{MessageQueue, ObjectReference, QueueMessage, SqsQueueClient, SqsQueueConfig};
pub use store::{FetchedObject, HttpObjectStore, HttpObjectStoreConfig, ObjectFetcher, ObjectStore};
pub use worker::{setup_signal_handler, Classification, MessageProcessor, WorkerConfig, WorkerRunner};

use std::path::Path;

/// Classify a single local image file
///
/// One-shot convenience used by the `classify` subcommand: loads the model,
/// runs one image through it, and returns the ranked predictions. The worker
/// loop does NOT call this - it keeps one long-lived classifier for the life
/// of the process.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use vision_worker::classify_file;
///
/// #[tokio::main]
/// async fn main() -> vision_worker::Result<()> {
///     let predictions = classify_file(
///         Path::new("models/resnet50.onnx"),
///         Path::new("models/imagenet_classes.txt"),
///         Path::new("cat.jpg"),
///         3,
///     )
///     .await?;
///
///     for p in predictions {
///         println!("{}: {:.3}", p.label, p.confidence);
///     }
///     Ok(())
/// }
/// ```
pub async fn classify_file(
    model_path: &Path,
    labels_path: &Path,
    image_path: &Path,
    top_k: usize,
) -> Result<Vec<Prediction>> {
    let classifier = OnnxClassifier::load(model_path, labels_path, top_k)?;
    classifier.classify(image_path).await
}
