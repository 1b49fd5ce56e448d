//! Typed configuration surface (§6, §10).
//!
//! Reading these values from a TOML file, environment variables, or argv is
//! an application concern (§1 Non-goals); this crate only defines the shape
//! and its defaults, built through a fluent builder in the same style the
//! bus adapter's own connection options are assembled.

use std::time::Duration;

/// Default queue-group name shared by every library instance competing for
/// the StasisStart fan-in.
pub const DEFAULT_QUEUE_GROUP: &str = "AsteriskARIProxyDistributionQueue";

/// Everything the client needs to connect, address its traffic, and bound
/// its own resource usage.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Subject prefix and bus client name; required.
    pub connection_name: String,
    /// Stasis application name this client handles calls for; required.
    pub application_name: String,
    /// Bus connection URL; required.
    pub bus_url: String,
    /// Timeout applied to every RPC request. Default 3s.
    pub request_timeout: Duration,
    /// Delay between reconnect attempts. Default 5s.
    pub reconnect_wait: Duration,
    /// Maximum reconnect attempts before giving up. Default 5.
    pub max_reconnects: usize,
    /// Keepalive ping interval. Default 20s.
    pub ping_interval: Duration,
    /// Outstanding unanswered pings tolerated before the connection is
    /// considered dead. Default 3.
    pub max_outstanding_pings: usize,
    /// Concurrency bound for the event dispatcher's worker pool. Default 1000.
    pub dispatcher_pool_size: usize,
    /// Queue-group name for the StasisStart fan-in.
    pub queue_group: String,
}

impl ClientConfig {
    /// Start building a config for the given required fields.
    pub fn builder(
        connection_name: impl Into<String>,
        application_name: impl Into<String>,
        bus_url: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                connection_name: connection_name.into(),
                application_name: application_name.into(),
                bus_url: bus_url.into(),
                ..ClientConfig::defaults()
            },
        }
    }

    fn defaults() -> Self {
        ClientConfig {
            connection_name: String::new(),
            application_name: String::new(),
            bus_url: String::new(),
            request_timeout: Duration::from_secs(3),
            reconnect_wait: Duration::from_secs(5),
            max_reconnects: 5,
            ping_interval: Duration::from_secs(20),
            max_outstanding_pings: 3,
            dispatcher_pool_size: 1000,
            queue_group: DEFAULT_QUEUE_GROUP.to_string(),
        }
    }
}

/// Fluent builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn reconnect_wait(mut self, wait: Duration) -> Self {
        self.config.reconnect_wait = wait;
        self
    }

    pub fn max_reconnects(mut self, max: usize) -> Self {
        self.config.max_reconnects = max;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn max_outstanding_pings(mut self, max: usize) -> Self {
        self.config.max_outstanding_pings = max;
        self
    }

    pub fn dispatcher_pool_size(mut self, size: usize) -> Self {
        self.config.dispatcher_pool_size = size;
        self
    }

    pub fn queue_group(mut self, name: impl Into<String>) -> Self {
        self.config.queue_group = name.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ClientConfig::builder("ari", "myapp", "nats://localhost:4222").build();
        assert_eq!(cfg.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.reconnect_wait, Duration::from_secs(5));
        assert_eq!(cfg.max_reconnects, 5);
        assert_eq!(cfg.ping_interval, Duration::from_secs(20));
        assert_eq!(cfg.max_outstanding_pings, 3);
        assert_eq!(cfg.dispatcher_pool_size, 1000);
        assert_eq!(cfg.queue_group, DEFAULT_QUEUE_GROUP);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = ClientConfig::builder("ari", "myapp", "nats://localhost:4222")
            .max_reconnects(10)
            .dispatcher_pool_size(64)
            .build();
        assert_eq!(cfg.max_reconnects, 10);
        assert_eq!(cfg.dispatcher_pool_size, 64);
    }
}
