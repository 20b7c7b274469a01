//! Worker configuration

use std::time::Duration;

/// Policy for messages whose body cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Delete the message immediately so it cannot loop forever.
    #[default]
    Drop,

    /// Leave the message for redelivery.
    Redeliver,
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep when a poll returns no messages
    pub poll_interval: Duration,

    /// Max messages per receive call (backend cap is 10)
    pub batch_size: u32,

    /// How long received messages stay hidden before becoming redeliverable.
    /// Must exceed the worst-case per-message processing latency.
    pub visibility_timeout: Duration,

    /// Hard cap on one message's processing time
    pub message_timeout: Duration,

    /// Messages processed concurrently within a batch
    pub concurrency: usize,

    /// Sleep after a failed poll before retrying
    pub error_backoff: Duration,

    /// What to do with unparseable messages
    pub malformed_policy: MalformedPolicy,

    /// Delete a failing message once its delivery count reaches this cap
    pub max_receive_count: Option<u32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 10,
            visibility_timeout: Duration::from_secs(120),
            message_timeout: Duration::from_secs(60),
            concurrency: 1,
            error_backoff: Duration::from_secs(10),
            malformed_policy: MalformedPolicy::Drop,
            max_receive_count: None,
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for WorkerConfig
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set poll interval
    pub fn poll_interval(mut self, duration: Duration) -> Self {
        self.config.poll_interval = duration;
        self
    }

    /// Set poll interval in seconds
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval = Duration::from_secs(secs);
        self
    }

    /// Set batch size
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set visibility timeout
    pub fn visibility_timeout(mut self, duration: Duration) -> Self {
        self.config.visibility_timeout = duration;
        self
    }

    /// Set per-message timeout
    pub fn message_timeout(mut self, duration: Duration) -> Self {
        self.config.message_timeout = duration;
        self
    }

    /// Set in-batch concurrency
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set error backoff
    pub fn error_backoff(mut self, duration: Duration) -> Self {
        self.config.error_backoff = duration;
        self
    }

    /// Set malformed-message policy
    pub fn malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.config.malformed_policy = policy;
        self
    }

    /// Set the poison-message delivery cap
    pub fn max_receive_count(mut self, cap: Option<u32>) -> Self {
        self.config.max_receive_count = cap;
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}

impl Default for WorkerConfigBuilder {
    fn default() -> Self {
        Self {
            config: WorkerConfig::default(),
        }
    }
}
