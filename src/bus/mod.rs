//! Bus adapter (component C): the thin contract over pub/sub that the rest
//! of the crate is built against.
//!
//! The contract is an async trait rather than a concrete NATS type so unit
//! tests can run against [`crate::testing::MockBus`] while production code
//! runs against [`nats::NatsBus`]. §4.C requires the adapter to be
//! concurrency-safe, which the `Send + Sync` bound on [`Bus`] encodes.

pub mod nats;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ClientError, Result};

/// A callback invoked for every message delivered to a subscription.
///
/// Handlers run on whatever task the adapter drives its receive loop from;
/// §9's bus-thread-isolation note means handlers must not themselves issue
/// blocking `request` calls back onto the same connection.
pub type MessageHandler = Arc<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// Opaque reference to a live subscription, returned by [`Bus::subscribe`]
/// and [`Bus::queue_subscribe`], consumed by [`Bus::drain`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionHandle(pub(crate) u64);

/// Thin contract over subject-addressed pub/sub with request/reply and
/// queue groups (§4.C).
#[async_trait]
pub trait Bus: Send + Sync {
    /// Idempotent connect; retries are governed by the adapter's own
    /// reconnect configuration. Fails with [`ClientError::BusUnavailable`]
    /// after the configured attempts are exhausted.
    async fn connect(&self) -> Result<()>;

    /// Fire-and-forget publish. Fails with [`ClientError::BusUnavailable`]
    /// if the adapter is disconnected.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()>;

    /// Subscribe to `subject`; every matching message is delivered to every
    /// subscriber (no load-sharing).
    async fn subscribe(&self, subject: &str, handler: MessageHandler) -> Result<SubscriptionHandle>;

    /// Subscribe to `subject` as part of competing-consumer group `queue`:
    /// each message goes to exactly one member of the group.
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle>;

    /// Request/reply with a bound on how long to wait for the answer.
    async fn request(&self, subject: &str, payload: Vec<u8>, timeout: Duration) -> Result<Vec<u8>>;

    /// Stop delivering new messages to `handle`; allow any in-flight
    /// handler invocation to finish first.
    async fn drain(&self, handle: SubscriptionHandle) -> Result<()>;
}

/// Convenience used by adapters to turn a timed-out `tokio::time::timeout`
/// into the right [`ClientError`] variant.
pub(crate) fn timeout_error(subject: &str, timeout: Duration) -> ClientError {
    ClientError::Timeout {
        subject: subject.to_string(),
        timeout,
    }
}
