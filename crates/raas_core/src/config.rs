//! Store configuration.

use crate::error::{CoreError, CoreResult};
use crate::types::SubpartitionLayout;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Maximum time a full traversal may take and still be guaranteed to see a
/// consistent active set. Also the default tombstone retention of the log.
pub const STALENESS_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Which backend a [`crate::Store`] runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-memory [`crate::ReferenceStore`].
    Reference,
    /// Log-backed [`crate::LogStore`].
    #[default]
    Log,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reference => "reference",
            Self::Log => "log",
        })
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" | "memory" => Ok(Self::Reference),
            "log" => Ok(Self::Log),
            other => Err(CoreError::config(format!("unknown backend {other:?}"))),
        }
    }
}

/// Configuration of the log-backed store.
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    /// Prefix of every topic name.
    pub topic_prefix: String,

    /// Maximum wait for a write acknowledgement.
    pub ack_timeout: Duration,

    /// Wait budget of a single consumer poll.
    pub poll_timeout: Duration,

    /// Maximum records fetched per poll.
    pub max_poll_records: usize,

    /// How long records (including tombstones) are retained.
    pub retention: Duration,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "tc_raw_active_alarms".to_string(),
            ack_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_millis(100),
            max_poll_records: 500,
            retention: STALENESS_WINDOW,
        }
    }
}

impl LogStoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the topic prefix.
    #[must_use]
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Sets the write acknowledgement timeout.
    #[must_use]
    pub const fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Sets the poll timeout.
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the maximum records per poll.
    #[must_use]
    pub const fn max_poll_records(mut self, max: usize) -> Self {
        self.max_poll_records = max;
        self
    }

    /// Sets the retention period.
    #[must_use]
    pub const fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> CoreResult<()> {
        raas_log::validate_topic_name(&self.topic_prefix)
            .map_err(|e| CoreError::config(format!("topic prefix: {e}")))?;
        if self.max_poll_records == 0 {
            return Err(CoreError::config("max_poll_records must be at least 1"));
        }
        if self.ack_timeout.is_zero() {
            return Err(CoreError::config("ack_timeout must be positive"));
        }
        Ok(())
    }
}

/// Configuration for opening a [`crate::Store`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Backend to run on.
    pub backend: BackendKind,

    /// Subpartitions every partition is created with.
    pub layout: SubpartitionLayout,

    /// Log backend settings, ignored by the reference backend.
    pub log: LogStoreConfig,
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend.
    #[must_use]
    pub const fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the subpartition layout.
    #[must_use]
    pub const fn layout(mut self, layout: SubpartitionLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the log backend settings.
    #[must_use]
    pub fn log(mut self, log: LogStoreConfig) -> Self {
        self.log = log;
        self
    }
}
