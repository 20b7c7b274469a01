//! SQS-compatible queue client speaking the JSON wire protocol
//!
//! Works against any endpoint that implements the `x-amz-json-1.0` flavor of
//! the SQS API (ElasticMQ, LocalStack, and friends). Request signing is a
//! deployment concern and is not handled here.

use crate::error::{Result, WorkerError};
use crate::queue::{MessageQueue, QueueMessage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const TARGET_RECEIVE: &str = "AmazonSQS.ReceiveMessage";
const TARGET_DELETE: &str = "AmazonSQS.DeleteMessage";
const PROTOCOL_CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Connection settings for an SQS-compatible endpoint.
#[derive(Debug, Clone)]
pub struct SqsQueueConfig {
    /// Service endpoint, e.g. `http://localhost:9324`
    pub endpoint: String,

    /// Queue URL passed in every request
    pub queue_url: String,

    /// Long-poll wait per receive call (backend cap is 20 seconds)
    pub wait_time: Duration,

    /// Connection timeout (default: 10 seconds)
    pub connect_timeout: Duration,

    /// Request timeout; must exceed the long-poll wait (default: 30 seconds)
    pub request_timeout: Duration,
}

impl Default for SqsQueueConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            queue_url: String::new(),
            wait_time: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Queue client for SQS-compatible endpoints.
pub struct SqsQueueClient {
    client: Client,
    config: SqsQueueConfig,
}

#[derive(Deserialize)]
struct ReceiveMessageResponse {
    #[serde(rename = "Messages", default)]
    messages: Vec<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "MessageId", default)]
    message_id: String,

    #[serde(rename = "ReceiptHandle")]
    receipt_handle: String,

    #[serde(rename = "Body", default)]
    body: String,

    #[serde(rename = "Attributes", default)]
    attributes: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "__type", default)]
    kind: String,

    #[serde(default)]
    message: String,
}

impl SqsQueueClient {
    pub fn new(config: SqsQueueConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(WorkerError::QueueTransport)?;

        Ok(Self { client, config })
    }

    async fn call(&self, target: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, PROTOCOL_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(WorkerError::QueueTransport)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error = response.json::<ApiError>().await.unwrap_or_else(|_| ApiError {
            kind: format!("HTTP {}", status),
            message: String::new(),
        });

        Err(WorkerError::QueueApi {
            kind: error.kind,
            message: error.message,
        })
    }
}

#[async_trait]
impl MessageQueue for SqsQueueClient {
    async fn receive(
        &self,
        max_messages: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueueMessage>> {
        let request = json!({
            "QueueUrl": self.config.queue_url,
            "MaxNumberOfMessages": max_messages,
            "VisibilityTimeout": visibility_timeout.as_secs(),
            "WaitTimeSeconds": self.config.wait_time.as_secs(),
            "AttributeNames": ["ApproximateReceiveCount"],
        });

        let response = self.call(TARGET_RECEIVE, request).await?;
        let parsed: ReceiveMessageResponse = response
            .json()
            .await
            .map_err(WorkerError::QueueTransport)?;

        let messages: Vec<QueueMessage> = parsed
            .messages
            .into_iter()
            .map(|raw| {
                let receive_count = raw
                    .attributes
                    .get("ApproximateReceiveCount")
                    .and_then(|v| v.parse().ok());
                QueueMessage {
                    message_id: raw.message_id,
                    receipt_handle: raw.receipt_handle,
                    body: raw.body,
                    receive_count,
                }
            })
            .collect();

        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        let request = json!({
            "QueueUrl": self.config.queue_url,
            "ReceiptHandle": message.receipt_handle,
        });

        self.call(TARGET_DELETE, request).await?;
        debug!("Deleted message {}", message.message_id);
        Ok(())
    }
}
