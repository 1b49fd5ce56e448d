//! Error taxonomy for the cluster client.
//!
//! ## Why
//! Every failure mode named in the request/response façade (§7 of the design
//! notes) has to be matchable by callers without string-sniffing a message,
//! while still carrying enough context to log usefully. A single
//! [`thiserror`]-derived enum gives both: `Display` for humans, variants for
//! `match`.

use std::time::Duration;

use crate::key::Key;

/// All ways a cluster-client operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A command was attempted with a key that is not coordinate-complete
    /// (missing `node` and/or `app`). The request never reached the bus.
    #[error("key {key:?} is not coordinate-complete (node and app are both required)")]
    IncompleteCoordinates {
        /// The offending key.
        key: Key,
    },

    /// The bus adapter is not connected, or a publish/request failed because
    /// the connection dropped.
    #[error("bus unavailable: {reason}")]
    BusUnavailable {
        /// Adapter-supplied detail, e.g. the underlying transport error text.
        reason: String,
    },

    /// No reply arrived within the configured request timeout.
    #[error("request on subject {subject} timed out after {timeout:?}")]
    Timeout {
        /// Subject the request was sent to.
        subject: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The remote side answered with the sentinel `"Not found"` error text.
    #[error("not found: {subject}")]
    NotFound {
        /// Subject the request was sent to.
        subject: String,
    },

    /// The remote side answered successfully but the field the verb expected
    /// (`key`, `keys`, or `data`) was absent.
    #[error("nil result for {subject} ({verb} expected a populated field)")]
    Nil {
        /// Subject the request was sent to.
        subject: String,
        /// Verb that was issued (`command`, `get`, `data`, `create`, `list`).
        verb: &'static str,
    },

    /// The remote side answered with a non-empty `error` field other than
    /// `"Not found"`.
    #[error("remote error on {subject}: {message}")]
    Remote {
        /// Subject the request was sent to.
        subject: String,
        /// The `error` string the remote side sent back.
        message: String,
    },

    /// The response payload did not parse as the expected envelope shape.
    #[error("failed to decode response from {subject}: {source}")]
    Decode {
        /// Subject the request was sent to.
        subject: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
