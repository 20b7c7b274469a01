//! Per-message processing: parse, fetch, classify, report

use crate::error::Result;
use crate::inference::{Classifier, Prediction};
use crate::queue::{ObjectReference, QueueMessage};
use crate::store::ObjectFetcher;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// The reported outcome of one message.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Object key the predictions belong to
    pub key: String,

    /// Ranked predictions, highest confidence first
    pub predictions: Vec<Prediction>,

    pub completed_at: DateTime<Utc>,
}

impl Classification {
    /// Highest-confidence prediction, if any.
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }
}

/// Processes one message end to end.
pub struct MessageProcessor {
    fetcher: ObjectFetcher,
    classifier: Arc<dyn Classifier>,
    bucket: String,
}

impl MessageProcessor {
    pub fn new(
        fetcher: ObjectFetcher,
        classifier: Arc<dyn Classifier>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            bucket: bucket.into(),
        }
    }

    /// Parse, fetch, classify, and report one message.
    ///
    /// The downloaded file is removed on every exit path. The message itself
    /// is untouched here; deletion is the caller's decision.
    pub async fn process(&self, message: &QueueMessage) -> Result<Classification> {
        let key = message.object_key()?;
        let reference = ObjectReference {
            bucket: self.bucket.clone(),
            key: key.clone(),
        };

        let start = Instant::now();
        let fetched = self.fetcher.fetch(&reference).await?;
        let predictions = self.classifier.classify(fetched.path()).await?;

        let classification = Classification {
            key,
            predictions,
            completed_at: Utc::now(),
        };
        self.report(&classification, start.elapsed());

        Ok(classification)
    }

    fn report(&self, classification: &Classification, elapsed: Duration) {
        match classification.top() {
            Some(top) => info!(
                key = %classification.key,
                label = %top.label,
                confidence = top.confidence,
                elapsed_ms = elapsed.as_millis() as u64,
                "Classified object"
            ),
            None => info!(
                key = %classification.key,
                "Classifier returned no predictions"
            ),
        }
    }
}
