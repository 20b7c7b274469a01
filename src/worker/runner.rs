//! Worker runner - main polling loop

use crate::error::{Result, WorkerError};
use crate::queue::{MessageQueue, QueueMessage};
use crate::worker::{MalformedPolicy, MessageProcessor, WorkerConfig};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Worker runner that polls the queue and processes message batches
pub struct WorkerRunner {
    queue: Arc<dyn MessageQueue>,
    config: WorkerConfig,
    processor: MessageProcessor,
    shutdown: Arc<AtomicBool>,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        config: WorkerConfig,
        processor: MessageProcessor,
    ) -> Self {
        Self {
            queue,
            config,
            processor,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Main worker loop
    ///
    /// Polls the queue and processes batches until shutdown is signaled.
    pub async fn run(&self) -> Result<()> {
        info!("Starting classification worker...");
        info!("Batch size: {}", self.config.batch_size);
        info!("Visibility timeout: {:?}", self.config.visibility_timeout);
        info!("Concurrency: {}", self.config.concurrency);

        if self.config.message_timeout >= self.config.visibility_timeout {
            warn!(
                "Message timeout {:?} is not below visibility timeout {:?}; duplicate processing becomes likely",
                self.config.message_timeout, self.config.visibility_timeout
            );
        }

        loop {
            // Check for shutdown signal
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping worker...");
                break;
            }

            match self.process_one_batch().await {
                Ok(0) => {
                    debug!("Queue empty, sleeping for {:?}", self.config.poll_interval);
                    sleep(self.config.poll_interval).await;
                }
                Ok(count) => {
                    info!("Processed batch of {}, polling for more...", count);
                }
                Err(e) => {
                    error!("Poll failed: {}", e);
                    sleep(self.config.error_backoff).await;
                }
            }
        }

        info!("Worker stopped");
        Ok(())
    }

    /// Receive and process a single batch.
    ///
    /// Returns the number of messages received; zero means the poll came back
    /// empty. Individual message failures never fail the batch - those
    /// messages simply stay undeleted and come back after the visibility
    /// timeout.
    pub async fn process_one_batch(&self) -> Result<usize> {
        let messages = self
            .queue
            .receive(self.config.batch_size, self.config.visibility_timeout)
            .await?;

        if messages.is_empty() {
            return Ok(0);
        }

        let count = messages.len();
        stream::iter(messages)
            .for_each_concurrent(self.config.concurrency, |message| async move {
                if self.shutdown.load(Ordering::Relaxed) {
                    // Not started yet; the message redelivers after its
                    // visibility timeout.
                    return;
                }
                self.handle_message(&message).await;
            })
            .await;

        Ok(count)
    }

    /// Process a single batch and exit (useful with the --once flag)
    pub async fn run_once(&self) -> Result<usize> {
        info!("Running worker in single-batch mode...");
        self.process_one_batch().await
    }

    async fn handle_message(&self, message: &QueueMessage) {
        let outcome = tokio::time::timeout(
            self.config.message_timeout,
            self.processor.process(message),
        )
        .await;

        match outcome {
            Ok(Ok(_)) => {
                if let Err(e) = self.queue.delete(message).await {
                    // The message will be processed again after redelivery;
                    // acceptable under at-least-once, but never silent.
                    error!("Failed to delete message {}: {}", message.message_id, e);
                }
            }
            Ok(Err(WorkerError::MalformedMessage(reason))) => {
                self.handle_malformed(message, &reason).await;
            }
            Ok(Err(e)) => {
                error!("Message {} failed: {}", message.message_id, e);
                self.drop_if_poisoned(message).await;
            }
            Err(_) => {
                error!(
                    "Message {} timed out after {:?}",
                    message.message_id, self.config.message_timeout
                );
                self.drop_if_poisoned(message).await;
            }
        }
    }

    async fn handle_malformed(&self, message: &QueueMessage, reason: &str) {
        match self.config.malformed_policy {
            MalformedPolicy::Drop => {
                warn!("Dropping malformed message {}: {}", message.message_id, reason);
                if let Err(e) = self.queue.delete(message).await {
                    error!(
                        "Failed to delete malformed message {}: {}",
                        message.message_id, e
                    );
                }
            }
            MalformedPolicy::Redeliver => {
                warn!(
                    "Leaving malformed message {} for redelivery: {}",
                    message.message_id, reason
                );
                self.drop_if_poisoned(message).await;
            }
        }
    }

    /// Delete a failing message once it has exhausted its delivery budget.
    ///
    /// Disabled unless `max_receive_count` is configured; the queue-side
    /// dead-letter policy is the usual place for this.
    async fn drop_if_poisoned(&self, message: &QueueMessage) {
        let Some(cap) = self.config.max_receive_count else {
            return;
        };
        let Some(count) = message.receive_count else {
            return;
        };

        if count >= cap {
            error!(
                "Message {} failed {} deliveries, dropping it",
                message.message_id, count
            );
            if let Err(e) = self.queue.delete(message).await {
                error!(
                    "Failed to delete poison message {}: {}",
                    message.message_id, e
                );
            }
        }
    }
}

/// Setup signal handlers for graceful shutdown
pub fn setup_signal_handler(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });
}
