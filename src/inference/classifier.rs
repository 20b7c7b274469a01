//! ONNX image classification

use crate::error::{Result, WorkerError};
use crate::inference::labels::Labels;
use crate::inference::preprocess;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Number of ranked predictions reported per image.
pub const DEFAULT_TOP_K: usize = 3;

/// A single ranked prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Inference port. Production runs an ONNX plan; tests swap in a canned
/// double.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the image at `path`, returning predictions ranked by
    /// confidence. Deterministic: the same bytes produce the same ranking.
    async fn classify(&self, path: &Path) -> Result<Vec<Prediction>>;
}

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Classifier backed by a tract ONNX plan.
pub struct OnnxClassifier {
    model: RunnableModel,
    labels: Labels,
    top_k: usize,
}

impl OnnxClassifier {
    /// Load and optimize the model. Called once per process; the resulting
    /// plan is shared read-only across all invocations.
    pub fn load(model_path: &Path, labels_path: &Path, top_k: usize) -> Result<Self> {
        let start = Instant::now();
        let (width, height) = preprocess::INPUT_SIZE;

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|m| {
                m.with_input_fact(0, f32::fact([1, 3, height as i64, width as i64]).into())
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| WorkerError::ModelLoad {
                path: model_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let labels = Labels::from_file(labels_path)?;
        info!(
            "Loaded model {} ({} classes) in {:?}",
            model_path.display(),
            labels.len(),
            start.elapsed()
        );

        Ok(Self { model, labels, top_k })
    }

    fn run(&self, data: &[u8]) -> Result<Vec<Prediction>> {
        let image = preprocess::decode_image(data)?;
        let input = preprocess::to_input_tensor(&image);

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| WorkerError::Inference(e.to_string()))?;
        let logits = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| WorkerError::Inference(e.to_string()))?;
        let logits: Vec<f32> = logits.iter().copied().collect();

        let probabilities = softmax(&logits);
        let ranked = top_k(&probabilities, self.top_k);

        Ok(ranked
            .into_iter()
            .map(|(index, confidence)| Prediction {
                label: self.labels.get(index).to_string(),
                confidence,
            })
            .collect())
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn classify(&self, path: &Path) -> Result<Vec<Prediction>> {
        let data = tokio::fs::read(path).await?;

        let start = Instant::now();
        let predictions = self.run(&data)?;
        debug!("Classified {} in {:?}", path.display(), start.elapsed());
        Ok(predictions)
    }
}

/// Convert logits to probabilities.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}

/// Indices of the `k` highest probabilities, highest first.
fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.truncate(k);
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_preserves_ranking() {
        let probabilities = softmax(&[0.5, 3.0, -1.0]);
        assert!(probabilities[1] > probabilities[0]);
        assert!(probabilities[0] > probabilities[2]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probabilities = softmax(&[1000.0, 999.0]);
        assert!(probabilities.iter().all(|p| p.is_finite()));
        assert!(probabilities[0] > probabilities[1]);
    }

    #[test]
    fn test_top_k_orders_by_confidence() {
        let ranked = top_k(&[0.1, 0.7, 0.2], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 2);
    }

    #[test]
    fn test_top_k_caps_at_available_classes() {
        let ranked = top_k(&[0.9, 0.1], 5);
        assert_eq!(ranked.len(), 2);
    }
}
