//! Clustered client library for Stasis-style telephony control over a
//! subject-addressed message bus.
//!
//! A [`Client`] is the entry point: construct one from a [`ClientConfig`],
//! call [`Client::listen`] with a [`StasisHandler`] to start taking calls,
//! and use the `channel()`/`bridge()`/`playback()`/`live_recording()`/
//! `stored_recording()`/`asterisk()` accessors to operate on cluster
//! resources from anywhere — inside a handler, from a background task, or
//! from code that never sees a StasisStart at all.
//!
//! ```no_run
//! use ari_cluster_client::{Client, ClientConfig};
//!
//! # async fn run() -> ari_cluster_client::error::Result<()> {
//! let config = ClientConfig::builder("ari", "myapp", "nats://localhost:4222").build();
//! let client = Client::new(config);
//! client
//!     .listen(std::sync::Arc::new(|client, channel, _event| {
//!         Box::pin(async move {
//!             let _ = client;
//!             let _ = channel.answer().await;
//!         })
//!     }))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod bus;
mod client;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
mod future;
pub mod handles;
pub mod key;
mod lifecycle;
pub mod registry;
pub mod rpc;
pub mod testing;

pub use client::{Client, StasisHandler};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use future::BoxFuture;
