//! Production [`Bus`] adapter over a NATS-compatible message bus.
//!
//! Grounded in the connect/reconnect/request-with-timeout shape of a
//! control-plane client built on `async-nats`: one long-lived
//! [`async_nats::Client`], a bookkeeping table of spawned receive loops so
//! [`Bus::drain`] can cancel one subscription without tearing down the
//! whole connection, and `tokio::time::timeout` wrapping every request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::sync::{OnceCell, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::{Bus, MessageHandler, SubscriptionHandle, timeout_error};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

struct LiveSubscription {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// A [`Bus`] implementation backed by a real NATS connection.
pub struct NatsBus {
    config: ClientConfig,
    client: OnceCell<async_nats::Client>,
    subscriptions: DashMap<u64, LiveSubscription>,
    next_id: AtomicU64,
}

impl NatsBus {
    pub fn new(config: ClientConfig) -> Self {
        NatsBus {
            config,
            client: OnceCell::new(),
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn client(&self) -> Result<&async_nats::Client> {
        self.client.get().ok_or_else(|| ClientError::BusUnavailable {
            reason: "not connected".to_string(),
        })
    }

    fn spawn_receive_loop(
        &self,
        mut subscriber: async_nats::Subscriber,
        handler: MessageHandler,
    ) -> SubscriptionHandle {
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    next = subscriber.next() => {
                        match next {
                            Some(message) => handler(message.payload.to_vec()),
                            None => break,
                        }
                    }
                }
            }
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions.insert(
            id,
            LiveSubscription {
                cancel: cancel_tx,
                task,
            },
        );
        SubscriptionHandle(id)
    }
}

#[async_trait]
impl Bus for NatsBus {
    #[instrument(level = "info", skip(self), fields(connection = %self.config.connection_name))]
    async fn connect(&self) -> Result<()> {
        if self.client.initialized() {
            return Ok(());
        }
        let options = async_nats::ConnectOptions::new()
            .name(self.config.connection_name.clone())
            .ping_interval(self.config.ping_interval)
            .max_reconnects(Some(self.config.max_reconnects))
            .retry_on_initial_connect();

        let client = options
            .connect(&self.config.bus_url)
            .await
            .map_err(|e| ClientError::BusUnavailable { reason: e.to_string() })?;

        info!(url = %self.config.bus_url, "connected to bus");
        let _ = self.client.set(client);
        Ok(())
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        self.client()?
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| ClientError::BusUnavailable { reason: e.to_string() })
    }

    async fn subscribe(&self, subject: &str, handler: MessageHandler) -> Result<SubscriptionHandle> {
        let subscriber = self
            .client()?
            .subscribe(subject.to_string())
            .await
            .map_err(|e| ClientError::BusUnavailable { reason: e.to_string() })?;
        Ok(self.spawn_receive_loop(subscriber, handler))
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle> {
        let subscriber = self
            .client()?
            .queue_subscribe(subject.to_string(), queue.to_string())
            .await
            .map_err(|e| ClientError::BusUnavailable { reason: e.to_string() })?;
        Ok(self.spawn_receive_loop(subscriber, handler))
    }

    #[instrument(level = "debug", skip(self, payload))]
    async fn request(&self, subject: &str, payload: Vec<u8>, timeout: Duration) -> Result<Vec<u8>> {
        let client = self.client()?;
        match tokio::time::timeout(timeout, client.request(subject.to_string(), payload.into())).await {
            Ok(Ok(message)) => Ok(message.payload.to_vec()),
            Ok(Err(e)) => Err(ClientError::BusUnavailable { reason: e.to_string() }),
            Err(_) => {
                warn!(subject, ?timeout, "request timed out");
                Err(timeout_error(subject, timeout))
            }
        }
    }

    async fn drain(&self, handle: SubscriptionHandle) -> Result<()> {
        if let Some((_, live)) = self.subscriptions.remove(&handle.0) {
            let _ = live.cancel.send(());
            let _ = live.task.await;
        }
        Ok(())
    }
}
