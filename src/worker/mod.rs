//! Worker module for polling the queue and processing messages
//!
//! This module provides:
//! - WorkerRunner: Main loop that polls the queue in batches
//! - MessageProcessor: Processes individual messages (fetch + classify + report)
//! - WorkerConfig: Configuration for the worker

pub mod config;
pub mod processor;
pub mod runner;

pub use config::{MalformedPolicy, WorkerConfig};
pub use processor::{Classification, MessageProcessor};
pub use runner::{setup_signal_handler, WorkerRunner};
