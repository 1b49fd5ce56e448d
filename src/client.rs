//! Top-level client: wires the bus adapter, cluster registry, event
//! dispatcher, RPC façade, resource-handle factories, and subscription
//! lifecycle into the one type applications construct (§4).

use std::sync::Arc;

use crate::bus::Bus;
use crate::bus::nats::NatsBus;
use crate::config::ClientConfig;
use crate::dispatcher::EventDispatcher;
use crate::envelope::StasisEvent;
use crate::error::Result;
use crate::future::BoxFuture;
use crate::handles::{Asterisk, Bridges, Channels, ChannelHandle, LiveRecordings, Playbacks, StoredRecordings};
use crate::lifecycle::SubscriptionLifecycle;
use crate::registry::ClusterRegistry;
use crate::rpc::RpcFacade;

/// User-supplied StasisStart handler, invoked once per call with a fresh
/// [`ChannelHandle`] bound to the channel that entered the application
/// (§4.F). Handlers run on their own spawned task; a panicking handler takes
/// down only that task.
pub type StasisHandler =
    Arc<dyn Fn(Client, ChannelHandle, StasisEvent) -> BoxFuture<'static, ()> + Send + Sync>;

struct Inner {
    config: ClientConfig,
    registry: Arc<ClusterRegistry>,
    dispatcher: EventDispatcher,
    rpc: Arc<RpcFacade>,
    lifecycle: SubscriptionLifecycle,
}

/// The library's single entry point. Cheap to clone — every clone shares the
/// same bus connection, registry, dispatcher, and subscriptions.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Construct a client backed by a real NATS connection (§10).
    pub fn new(config: ClientConfig) -> Self {
        let bus: Arc<dyn Bus> = Arc::new(NatsBus::new(config.clone()));
        Client::with_bus(config, bus)
    }

    /// Construct a client over an arbitrary [`Bus`] — how this crate's own
    /// tests inject [`crate::testing::MockBus`].
    pub fn with_bus(config: ClientConfig, bus: Arc<dyn Bus>) -> Self {
        let rpc = Arc::new(RpcFacade::new(
            bus.clone(),
            config.connection_name.clone(),
            config.request_timeout,
        ));
        let registry = Arc::new(ClusterRegistry::new());
        let dispatcher = EventDispatcher::new(config.dispatcher_pool_size);
        let lifecycle = SubscriptionLifecycle::new(
            bus,
            registry.clone(),
            dispatcher.clone(),
            rpc.clone(),
            config.connection_name.clone(),
            config.application_name.clone(),
            config.queue_group.clone(),
        );

        Client {
            inner: Arc::new(Inner {
                config,
                registry,
                dispatcher,
                rpc,
                lifecycle,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The event dispatcher (component E), for registering listeners
    /// outside the per-call [`StasisHandler`].
    pub fn events(&self) -> &EventDispatcher {
        &self.inner.dispatcher
    }

    /// The live `node -> application` map (component D).
    pub fn registry(&self) -> &ClusterRegistry {
        &self.inner.registry
    }

    pub fn channel(&self) -> Channels {
        Channels::new(self.inner.rpc.clone())
    }

    pub fn bridge(&self) -> Bridges {
        Bridges::new(self.inner.rpc.clone())
    }

    pub fn playback(&self) -> Playbacks {
        Playbacks::new(self.inner.rpc.clone())
    }

    pub fn live_recording(&self) -> LiveRecordings {
        LiveRecordings::new(self.inner.rpc.clone())
    }

    pub fn stored_recording(&self) -> StoredRecordings {
        StoredRecordings::new(self.inner.rpc.clone())
    }

    pub fn asterisk(&self) -> Asterisk {
        Asterisk::new(self.inner.rpc.clone())
    }

    /// Connect the bus and start the subscription lifecycle: announce
    /// fan-in into the cluster registry, and the StasisStart queue-subscribe
    /// fan-in that invokes `handler` for every call (§4.F).
    pub async fn listen(&self, handler: StasisHandler) -> Result<()> {
        self.inner.lifecycle.listen(self.clone(), handler).await
    }

    /// Drain every subscription opened by [`Self::listen`] (§4.F).
    pub async fn close(&self) -> Result<()> {
        self.inner.lifecycle.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;

    fn config() -> ClientConfig {
        ClientConfig::builder("ari", "myapp", "nats://localhost:4222").build()
    }

    #[tokio::test]
    async fn accessors_construct_bound_factories() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus);

        let _channels = client.channel();
        let _bridges = client.bridge();
        let _playbacks = client.playback();
        let _live_recordings = client.live_recording();
        let _stored_recordings = client.stored_recording();
        let _asterisk = client.asterisk();
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let bus = Arc::new(MockBus::new());
        let client = Client::with_bus(config(), bus);
        let clone = client.clone();

        client.registry().update("nA", "myapp");
        assert_eq!(clone.registry().application_of("nA"), Some("myapp".to_string()));
    }
}
