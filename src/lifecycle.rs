//! Subscription lifecycle (component F) — the heart of the system (§4.F):
//! wires the announce fan-in into the cluster registry, the StasisStart
//! queue-subscribe fan-in into per-call dynamic subscriptions, and tears
//! both down again on [`SubscriptionLifecycle::close`].

use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;
use tracing::warn;

use crate::bus::{Bus, SubscriptionHandle};
use crate::client::{Client, StasisHandler};
use crate::dispatcher::EventDispatcher;
use crate::envelope::{Announcement, EventType, StasisEvent};
use crate::error::Result;
use crate::handles::ChannelHandle;
use crate::key::{self, Key, KeyKind};
use crate::registry::ClusterRegistry;
use crate::rpc::RpcFacade;

struct Inner {
    bus: Arc<dyn Bus>,
    registry: Arc<ClusterRegistry>,
    dispatcher: EventDispatcher,
    rpc: Arc<RpcFacade>,
    connection_name: String,
    application_name: String,
    queue_group: String,
    dynamic_subs: DashMap<String, SubscriptionHandle>,
    top_level_subs: Mutex<Vec<SubscriptionHandle>>,
}

/// Cheaply-cloneable handle to the subscription lifecycle's shared state.
#[derive(Clone)]
pub struct SubscriptionLifecycle {
    inner: Arc<Inner>,
}

impl SubscriptionLifecycle {
    pub(crate) fn new(
        bus: Arc<dyn Bus>,
        registry: Arc<ClusterRegistry>,
        dispatcher: EventDispatcher,
        rpc: Arc<RpcFacade>,
        connection_name: impl Into<String>,
        application_name: impl Into<String>,
        queue_group: impl Into<String>,
    ) -> Self {
        SubscriptionLifecycle {
            inner: Arc::new(Inner {
                bus,
                registry,
                dispatcher,
                rpc,
                connection_name: connection_name.into(),
                application_name: application_name.into(),
                queue_group: queue_group.into(),
                dynamic_subs: DashMap::new(),
                top_level_subs: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Connect the bus, subscribe to cluster announcements, and queue-subscribe
    /// the StasisStart fan-in (§4.F steps 1-3).
    pub async fn listen(&self, client: Client, handler: StasisHandler) -> Result<()> {
        self.inner.bus.connect().await?;

        let announce_subject = format!("{}.announce.*", self.inner.connection_name);
        let registry = self.inner.registry.clone();
        let announce_handle = self
            .inner
            .bus
            .subscribe(
                &announce_subject,
                Arc::new(move |payload: Vec<u8>| match Announcement::decode(&payload) {
                    Ok(announcement) => registry.apply_announcement(&announcement),
                    Err(error) => warn!(%error, "failed to decode announcement"),
                }),
            )
            .await?;
        self.inner.top_level_subs.lock().unwrap().push(announce_handle);

        let fan_in_subject = format!(
            "{}.{}.*.*.stasisstart.>",
            self.inner.connection_name, self.inner.application_name
        );
        let lifecycle = self.clone();
        let start_handle = self
            .inner
            .bus
            .queue_subscribe(
                &fan_in_subject,
                &self.inner.queue_group,
                Arc::new(move |payload: Vec<u8>| {
                    let lifecycle = lifecycle.clone();
                    let client = client.clone();
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        lifecycle.on_stasis_start(client, handler, payload).await;
                    });
                }),
            )
            .await?;
        self.inner.top_level_subs.lock().unwrap().push(start_handle);

        Ok(())
    }

    async fn on_stasis_start(&self, client: Client, handler: StasisHandler, payload: Vec<u8>) {
        let event = match StasisEvent::decode(&payload) {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, "failed to decode stasis-start event");
                return;
            }
        };

        let channel_id = event.channel.as_ref().map(|c| c.id.clone()).unwrap_or_default();
        let channel_key = Key::new(KeyKind::Channel, channel_id.clone())
            .with_app(event.application.clone())
            .with_node(event.node.clone());

        self.inner.dispatcher.dispatch(event.clone());

        // The per-call subscription (step 5) must not wait on the handler: a
        // handler that blocks for the call's lifetime (e.g. awaiting a
        // StasisEnd) would otherwise deadlock on a subscription this code
        // hasn't opened yet. Run the handler on its own task (§4.F step 3,
        // the contract documented on `StasisHandler`) and open the
        // subscription independently.
        let handle = ChannelHandle::new(self.inner.rpc.clone(), channel_key);
        tokio::spawn(handler(client, handle, event.clone()));

        self.subscribe_call(&event.application, &event.node, &channel_id).await;
    }

    /// Subscribe the per-call dynamic topic `T.>` (§4.F step 4-6). Failures
    /// are logged, not propagated — the handler has already run by this
    /// point (§4.F invariant).
    async fn subscribe_call(&self, app: &str, node: &str, channel_id: &str) {
        let topic = key::call_subject(&self.inner.connection_name, app, node, channel_id);
        let wildcard = format!("{topic}.>");
        let dispatcher = self.inner.dispatcher.clone();
        let lifecycle = self.clone();
        let topic_for_handler = topic.clone();

        let result = self
            .inner
            .bus
            .subscribe(
                &wildcard,
                Arc::new(move |payload: Vec<u8>| {
                    let dispatcher = dispatcher.clone();
                    let lifecycle = lifecycle.clone();
                    let topic = topic_for_handler.clone();
                    tokio::spawn(async move {
                        match StasisEvent::decode(&payload) {
                            Ok(event) => {
                                let is_end = event.event_type == EventType::StasisEnd;
                                dispatcher.dispatch(event);
                                if is_end {
                                    lifecycle.end_call(&topic).await;
                                }
                            }
                            Err(error) => warn!(%error, "failed to decode per-call event"),
                        }
                    });
                }),
            )
            .await;

        match result {
            Ok(handle) => {
                self.inner.dynamic_subs.insert(topic, handle);
            }
            Err(error) => warn!(%error, topic, "failed to create per-call subscription"),
        }
    }

    /// Drain and forget the per-call subscription for `topic`. A missing
    /// entry is not an error — double `StasisEnd` delivery is tolerated
    /// (§3 invariants).
    async fn end_call(&self, topic: &str) {
        if let Some((_, handle)) = self.inner.dynamic_subs.remove(topic) {
            if let Err(error) = self.inner.bus.drain(handle).await {
                warn!(%error, topic, "failed to drain per-call subscription");
            }
        }
    }

    /// Drain every outstanding dynamic subscription and the two top-level
    /// subscriptions (§4.F invariant).
    pub async fn close(&self) -> Result<()> {
        let topics: Vec<String> = self.inner.dynamic_subs.iter().map(|entry| entry.key().clone()).collect();
        for topic in topics {
            self.end_call(&topic).await;
        }

        let top_level = std::mem::take(&mut *self.inner.top_level_subs.lock().unwrap());
        for handle in top_level {
            if let Err(error) = self.inner.bus.drain(handle).await {
                warn!(%error, "failed to drain top-level subscription");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::config::ClientConfig;
    use crate::testing::MockBus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::builder("ari", "myapp", "nats://localhost:4222").build()
    }

    #[tokio::test]
    async fn announce_updates_registry_matching_s3() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus.clone());

        client
            .listen(Arc::new(|_, _, _| Box::pin(async {})))
            .await
            .unwrap();

        let announcement = br#"{"event_name":"proxy","node":"nB","application":"myapp"}"#;
        bus.deliver("ari.announce.nB", announcement.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(client.registry().application_of("nB"), Some("myapp".to_string()));
    }

    #[tokio::test]
    async fn stasis_start_invokes_handler_and_opens_dynamic_subscription() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus.clone());
        let invoked = Arc::new(AtomicUsize::new(0));
        let invoked_for_handler = invoked.clone();

        client
            .listen(Arc::new(move |_, handle: ChannelHandle, _| {
                let invoked = invoked_for_handler.clone();
                Box::pin(async move {
                    assert_eq!(handle.id(), "c1");
                    invoked.fetch_add(1, Ordering::SeqCst);
                })
            }))
            .await
            .unwrap();

        let start = br#"{"type":"StasisStart","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
        bus.deliver("ari.myapp.nA.c1.stasisstart.foo", start.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(invoked.load(Ordering::SeqCst), 1);

        let end = br#"{"type":"StasisEnd","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
        bus.deliver("ari.myapp.nA.c1.stasisend", end.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn double_stasis_end_is_idempotent() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus.clone());
        client
            .listen(Arc::new(|_, _, _| Box::pin(async {})))
            .await
            .unwrap();

        let start = br#"{"type":"StasisStart","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
        bus.deliver("ari.myapp.nA.c1.stasisstart.foo", start.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let end = br#"{"type":"StasisEnd","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
        bus.deliver("ari.myapp.nA.c1.stasisend", end.to_vec());
        bus.deliver("ari.myapp.nA.c1.stasisend", end.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn close_drains_every_subscription() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus.clone());
        client
            .listen(Arc::new(|_, _, _| Box::pin(async {})))
            .await
            .unwrap();

        let start = br#"{"type":"StasisStart","node":"nA","application":"myapp","channel":{"id":"c1"}}"#;
        bus.deliver("ari.myapp.nA.c1.stasisstart.foo", start.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;

        client.close().await.unwrap();
    }
}
