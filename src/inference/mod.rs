//! ONNX-based image classification
//!
//! The model is loaded and optimized once per worker process and shared
//! read-only across invocations; reloading per message would dominate
//! processing latency.

pub mod classifier;
pub mod labels;
pub mod preprocess;

pub use classifier::{Classifier, OnnxClassifier, Prediction, DEFAULT_TOP_K};
pub use labels::Labels;
