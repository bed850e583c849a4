//! Error types for acknowledged xDS pushes.
//!
//! This module provides two error types:
//!
//! - [`XdsError`] covers failures surfaced to the control plane itself:
//!   bad wire input, configuration mistakes and failed pushes.
//! - [`CompletionError`] is the cloneable outcome delivered to completions,
//!   callbacks and wait groups when a push does not succeed.

/// Comprehensive error type for xDS control plane operations.
///
/// # Example
///
/// ```rust
/// use xds_core::XdsError;
///
/// fn parse(version: &str) -> Result<u64, XdsError> {
///     version.parse().map_err(|_| XdsError::InvalidVersion {
///         field: "version_info",
///         value: version.to_string(),
///     })
/// }
///
/// assert!(parse("v1").is_err());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum XdsError {
    /// Malformed or unknown type URL.
    #[error("invalid type URL: {type_url} - {reason}")]
    InvalidTypeUrl {
        /// The invalid type URL.
        type_url: String,
        /// Reason why the type URL is invalid.
        reason: String,
    },

    /// A version or nonce received from a node could not be parsed.
    #[error("invalid {field}: {value:?} is not a version number")]
    InvalidVersion {
        /// The request field that carried the value.
        field: &'static str,
        /// The raw value received.
        value: String,
    },

    /// A node rejected a pushed version (NACK).
    #[error("NACK received from {node_id} for {type_url} version {version}: {detail}")]
    NackReceived {
        /// The node that rejected the version, empty when aggregated.
        node_id: String,
        /// The type URL that was rejected.
        type_url: String,
        /// The rejected version.
        version: u64,
        /// Error detail reported by the node.
        detail: String,
    },

    /// Operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// Operation was canceled by its caller.
    #[error("operation canceled: {operation}")]
    Canceled {
        /// Description of the canceled operation.
        operation: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl XdsError {
    /// Returns `true` if this error reports a NACK from a node.
    #[must_use]
    pub fn is_nack(&self) -> bool {
        matches!(self, Self::NackReceived { .. })
    }
}

/// Outcome of a completion that did not succeed.
///
/// Unlike [`XdsError`] this type is `Clone`: the same outcome is observed by
/// the completion's callback, by [`err`](../xds_completion/struct.Completion.html)
/// polls and by the wait group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// At least one targeted node failed to apply the version.
    ///
    /// `detail` is the error detail of the node whose report resolved the
    /// completion, preserved verbatim.
    #[error("NACK received: {detail}")]
    Nack {
        /// Type URL of the rejected resources.
        type_url: String,
        /// Version the completion was waiting for.
        version: u64,
        /// Error detail reported by the node.
        detail: String,
    },

    /// The wait group's context was canceled.
    #[error("context canceled")]
    Canceled,

    /// The wait group's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl CompletionError {
    /// Returns `true` for a NACK outcome.
    #[must_use]
    pub fn is_nack(&self) -> bool {
        matches!(self, Self::Nack { .. })
    }

    /// Returns `true` if the outcome comes from the context ending.
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }

    /// The node-supplied error detail, for NACKs.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Nack { detail, .. } => Some(detail.as_str()),
            _ => None,
        }
    }
}

impl From<CompletionError> for XdsError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Nack {
                type_url,
                version,
                detail,
            } => XdsError::NackReceived {
                node_id: String::new(),
                type_url,
                version,
                detail,
            },
            CompletionError::Canceled => XdsError::Canceled {
                operation: "wait for ACK".to_string(),
            },
            CompletionError::DeadlineExceeded => XdsError::Timeout {
                operation: "wait for ACK".to_string(),
            },
        }
    }
}
