//! Queue message model and body parsing

use crate::error::{Result, WorkerError};
use serde::Deserialize;

/// A single message delivered by the queue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: String,

    /// Opaque per-delivery token required to delete the message.
    pub receipt_handle: String,

    /// Raw JSON body as delivered.
    pub body: String,

    /// Delivery count as reported by the backend, when available.
    pub receive_count: Option<u32>,
}

/// Identifies a retrievable object: fixed bucket plus per-message key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

// Object-created event shape published by the store. Only the fields we
// consume are modeled.
#[derive(Deserialize)]
struct EventBody {
    #[serde(rename = "Records", default)]
    records: Vec<EventRecord>,
}

#[derive(Deserialize)]
struct EventRecord {
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    object: S3Object,
}

#[derive(Deserialize)]
struct S3Object {
    key: String,
}

impl QueueMessage {
    /// Extract the object key from the event body.
    ///
    /// Only the first record is consulted. A body that is not valid JSON,
    /// has zero records, or carries an empty key is a malformed message.
    pub fn object_key(&self) -> Result<String> {
        let body: EventBody = serde_json::from_str(&self.body)
            .map_err(|e| WorkerError::MalformedMessage(format!("invalid JSON: {}", e)))?;

        let record = body
            .records
            .into_iter()
            .next()
            .ok_or_else(|| WorkerError::MalformedMessage("no records in body".to_string()))?;

        let key = record.s3.object.key;
        if key.is_empty() {
            return Err(WorkerError::MalformedMessage("empty object key".to_string()));
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_body(body: &str) -> QueueMessage {
        QueueMessage {
            message_id: "m-1".to_string(),
            receipt_handle: "rh-1".to_string(),
            body: body.to_string(),
            receive_count: Some(1),
        }
    }

    #[test]
    fn test_extracts_key_from_event_body() {
        let message =
            message_with_body(r#"{"Records":[{"s3":{"object":{"key":"cat.jpg"}}}]}"#);
        assert_eq!(message.object_key().unwrap(), "cat.jpg");
    }

    #[test]
    fn test_only_first_record_is_consulted() {
        let body = r#"{"Records":[
            {"s3":{"object":{"key":"first.jpg"}}},
            {"s3":{"object":{"key":"second.jpg"}}}
        ]}"#;
        assert_eq!(message_with_body(body).object_key().unwrap(), "first.jpg");
    }

    #[test]
    fn test_empty_body_is_malformed() {
        let err = message_with_body("{}").object_key().unwrap_err();
        assert!(matches!(err, WorkerError::MalformedMessage(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = message_with_body("not json").object_key().unwrap_err();
        assert!(matches!(err, WorkerError::MalformedMessage(_)));
    }

    #[test]
    fn test_empty_records_list_is_malformed() {
        let err = message_with_body(r#"{"Records":[]}"#).object_key().unwrap_err();
        assert!(matches!(err, WorkerError::MalformedMessage(_)));
    }

    #[test]
    fn test_empty_key_is_malformed() {
        let err = message_with_body(r#"{"Records":[{"s3":{"object":{"key":""}}}]}"#)
            .object_key()
            .unwrap_err();
        assert!(matches!(err, WorkerError::MalformedMessage(_)));
    }
}
