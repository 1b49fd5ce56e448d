//! RPC façade (component G): the five typed verbs that every resource
//! handle operation boils down to.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::bus::Bus;
use crate::envelope::{EntityData, RequestEnvelope, ResponseEnvelope};
use crate::error::{ClientError, Result};
use crate::key::{Key, SubjectClass, subject};

/// Typed `command/get/data/create/list` operations over a [`Bus`].
///
/// Every call checks coordinate-completeness before touching the bus
/// (§3 invariants, §8 property 3), builds the subject via the key/subject
/// model (component A), and maps the decoded response per verb (§4.G).
pub struct RpcFacade {
    bus: Arc<dyn Bus>,
    connection_name: String,
    request_timeout: Duration,
}

impl RpcFacade {
    pub fn new(bus: Arc<dyn Bus>, connection_name: impl Into<String>, request_timeout: Duration) -> Self {
        RpcFacade {
            bus,
            connection_name: connection_name.into(),
            request_timeout,
        }
    }

    #[instrument(level = "debug", skip(self, envelope), fields(kind = %envelope.kind))]
    async fn call(&self, class: SubjectClass, envelope: &RequestEnvelope) -> Result<(String, ResponseEnvelope)> {
        let key = envelope
            .key
            .as_ref()
            .ok_or_else(|| ClientError::IncompleteCoordinates { key: Key::default() })?;
        if !key.is_coordinate_complete() {
            return Err(ClientError::IncompleteCoordinates { key: key.clone() });
        }

        let app = key.app().unwrap_or_default();
        let node = key.node().unwrap_or_default();
        let subject = subject(&self.connection_name, app, class, node);

        let payload = serde_json::to_vec(envelope).map_err(|source| ClientError::Decode {
            subject: subject.clone(),
            source,
        })?;

        let raw = self.bus.request(&subject, payload, self.request_timeout).await?;

        let response = ResponseEnvelope::decode(&raw).map_err(|source| ClientError::Decode {
            subject: subject.clone(),
            source,
        })?;

        if response.is_not_found() {
            return Err(ClientError::NotFound { subject });
        }
        if response.has_error() {
            return Err(ClientError::Remote {
                subject,
                message: response.error.clone(),
            });
        }

        Ok((subject, response))
    }

    /// `command` verb: expects `{error?}` only.
    pub async fn command(&self, envelope: &RequestEnvelope) -> Result<()> {
        self.call(SubjectClass::Command, envelope).await?;
        Ok(())
    }

    /// `get` verb: expects `{key?}`, `Nil` if absent.
    pub async fn get(&self, envelope: &RequestEnvelope) -> Result<Key> {
        let (subject, response) = self.call(SubjectClass::Get, envelope).await?;
        response.key.ok_or(ClientError::Nil { subject, verb: "get" })
    }

    /// `list` verb: expects `{keys?}`, an absent field is an empty list,
    /// not a `Nil` error — the proxy side often omits `keys` entirely when
    /// there is nothing to report.
    pub async fn list(&self, envelope: &RequestEnvelope) -> Result<Vec<Key>> {
        let (_, response) = self.call(SubjectClass::List, envelope).await?;
        Ok(response.keys.unwrap_or_default())
    }

    /// `data` verb: expects `{data?}`, returns the populated entity union.
    pub async fn data(&self, envelope: &RequestEnvelope) -> Result<EntityData> {
        let (subject, response) = self.call(SubjectClass::Data, envelope).await?;
        response.data.ok_or(ClientError::Nil { subject, verb: "data" })
    }

    /// `create` verb: expects `{key?, error?}`, returns the created
    /// resource's key.
    pub async fn create(&self, envelope: &RequestEnvelope) -> Result<Key> {
        let (subject, response) = self.call(SubjectClass::Create, envelope).await?;
        response.key.ok_or(ClientError::Nil { subject, verb: "create" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use crate::testing::MockBus;

    fn incomplete_key() -> Key {
        Key::new(KeyKind::Channel, "c1").with_node("nA")
    }

    fn complete_key() -> Key {
        Key::new(KeyKind::Channel, "c1").with_app("myapp").with_node("nA")
    }

    #[tokio::test]
    async fn incomplete_coordinates_never_touch_the_bus() {
        let bus = Arc::new(MockBus::new());
        let facade = RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3));
        let envelope = RequestEnvelope::bare("ChannelHangup", incomplete_key());

        let err = facade.command(&envelope).await.unwrap_err();
        assert!(matches!(err, ClientError::IncompleteCoordinates { .. }));
        assert_eq!(bus.request_count(), 0);
    }

    #[tokio::test]
    async fn happy_path_command_matches_s5() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.command.nA", |_| Ok(b"{}".to_vec()));
        let facade = RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3));
        let envelope = RequestEnvelope::bare("ChannelAnswer", complete_key());

        facade.command(&envelope).await.unwrap();

        let calls = bus.recorded_calls();
        assert_eq!(calls.len(), 1);
        if let crate::testing::Recorded::Request { subject, payload } = &calls[0] {
            assert_eq!(subject, "ari.myapp.command.nA");
            let sent: serde_json::Value = serde_json::from_slice(payload).unwrap();
            assert_eq!(sent["kind"], "ChannelAnswer");
        } else {
            panic!("expected a Request call");
        }
    }

    #[tokio::test]
    async fn not_found_mapping_matches_s6() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.data.nA", |_| Ok(br#"{"error":"Not found"}"#.to_vec()));
        let facade = RpcFacade::new(bus, "ari", Duration::from_secs(3));
        let envelope = RequestEnvelope::bare("BridgeData", complete_key());

        let err = facade.data(&envelope).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }
}
