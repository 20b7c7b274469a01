//! Queue client: message model, transport trait, and SQS-compatible implementation

pub mod message;
pub mod sqs;

pub use message::{ObjectReference, QueueMessage};
pub use sqs::{SqsQueueClient, SqsQueueConfig};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Queue port. Production talks to an SQS-compatible endpoint; tests swap in
/// an in-memory double.
///
/// Delivery is at-least-once: a received message that is not deleted before
/// its visibility timeout elapses becomes eligible for redelivery.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receive up to `max_messages`, hiding them from other consumers for
    /// `visibility_timeout`. Returning zero messages is a normal outcome.
    /// Each call is independent; no state is carried between polls.
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>>;

    /// Delete one message, identified by its receipt handle.
    async fn delete(&self, message: &QueueMessage) -> Result<()>;
}
