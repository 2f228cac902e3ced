//! Codec limits
//!
//! # Environment Variables
//!
//! - `RPCWIRE_MAX_MESSAGE_SIZE`: byte ceiling for one payload
//! - `RPCWIRE_MAX_BATCH_SIZE`: element ceiling for one batch

/// Default ceiling for a single payload: 32 MiB
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Default initial buffer capacity for byte sources
pub const DEFAULT_READ_SIZE_HINT: usize = 4096;

pub const MAX_MESSAGE_SIZE_ENV: &str = "RPCWIRE_MAX_MESSAGE_SIZE";
pub const MAX_BATCH_SIZE_ENV: &str = "RPCWIRE_MAX_BATCH_SIZE";

/// Limits applied by [`Codec`](crate::Codec)
///
/// ```rust
/// use rpcwire_io::CodecConfig;
///
/// let config = CodecConfig::default()
///     .with_max_message_size(1024)
///     .with_max_batch_size(16);
/// assert_eq!(config.max_message_size, 1024);
/// assert_eq!(config.max_batch_size, Some(16));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest payload accepted, in bytes
    pub max_message_size: usize,
    /// Longest batch accepted; `None` means unlimited
    pub max_batch_size: Option<usize>,
    /// Initial capacity of read buffers
    pub read_size_hint: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_message_size: env_usize(MAX_MESSAGE_SIZE_ENV).unwrap_or(DEFAULT_MAX_MESSAGE_SIZE),
            max_batch_size: env_usize(MAX_BATCH_SIZE_ENV),
            read_size_hint: DEFAULT_READ_SIZE_HINT,
        }
    }
}

impl CodecConfig {
    /// Defaults without consulting the environment
    pub fn unbounded_batches() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_batch_size: None,
            read_size_hint: DEFAULT_READ_SIZE_HINT,
        }
    }

    pub fn with_max_message_size(mut self, limit: usize) -> Self {
        self.max_message_size = limit;
        self
    }

    pub fn with_max_batch_size(mut self, limit: usize) -> Self {
        self.max_batch_size = Some(limit);
        self
    }

    pub fn without_batch_limit(mut self) -> Self {
        self.max_batch_size = None;
        self
    }

    pub fn with_read_size_hint(mut self, hint: usize) -> Self {
        self.read_size_hint = hint;
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring non-numeric codec limit");
            None
        }
    }
}
