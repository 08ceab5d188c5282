//! Error types for Earnwatch Core
//!
//! Persistence failures are never fatal to a watch session: callers log
//! them and keep playing. Config errors surface at startup.

/// Progress store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing storage failed to read or write
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        /// Storage key involved
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Persisted blob could not be decoded
    #[error("malformed persisted state: {0}")]
    Malformed(String),

    /// Persisted session violates its invariants
    #[error("corrupt session: max watched {max_watched}s exceeds duration {duration}s")]
    Corrupt {
        /// Stored high-water-mark
        max_watched: f64,
        /// Stored duration
        duration: f64,
    },

    /// Session could not be serialized
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the stored value should be thrown away
    ///
    /// Malformed or corrupt blobs are discarded; I/O errors are not the
    /// blob's fault and leave it alone.
    #[inline]
    #[must_use]
    pub fn is_discardable(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Corrupt { .. })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
