//! Bridge handle (§4.H), grounded in `bridge/bridge.go`'s `BridgeHandle` and
//! `bridge.go`'s `ibridge` — the one resource in the original that actually
//! wires up `StageCreate`, not just a stub.

use std::sync::Arc;

use crate::envelope::{BridgeAddChannel, BridgeCreate, BridgeData, BridgeMoh, BridgePlay, BridgeRemoveChannel, BridgeVideoSource, RequestEnvelope};
use crate::error::{ClientError, Result};
use crate::key::{Key, KeyKind};
use crate::rpc::RpcFacade;

use super::staged::StagedExec;

/// Additional per-channel options for [`BridgeHandle::add_channel_with_options`].
#[derive(Clone, Debug, Default)]
pub struct BridgeAddChannelOptions {
    pub absorb_dtmf: bool,
    pub mute: bool,
    pub role: String,
}

pub struct BridgeHandle {
    key: Key,
    rpc: Arc<RpcFacade>,
    staged: StagedExec,
}

impl BridgeHandle {
    pub(crate) fn new(rpc: Arc<RpcFacade>, key: Key) -> Self {
        BridgeHandle {
            key,
            rpc,
            staged: StagedExec::none(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id().unwrap_or_default()
    }

    pub async fn exec(&self) -> Result<()> {
        self.staged.exec().await
    }

    async fn command(&self, kind: &str, f: impl FnOnce(&mut RequestEnvelope)) -> Result<()> {
        let mut envelope = RequestEnvelope::bare(kind, self.key.clone());
        f(&mut envelope);
        self.rpc.command(&envelope).await
    }

    pub async fn add_channel(&self, channel_id: impl Into<String>) -> Result<()> {
        self.add_channel_with_options(channel_id, BridgeAddChannelOptions::default()).await
    }

    pub async fn add_channel_with_options(&self, channel_id: impl Into<String>, options: BridgeAddChannelOptions) -> Result<()> {
        self.command("BridgeAddChannel", |e| {
            e.bridge_add_channel = Some(BridgeAddChannel {
                channel: channel_id.into(),
                absorb_dtmf: options.absorb_dtmf,
                mute: options.mute,
                role: options.role,
            })
        })
        .await
    }

    pub async fn remove_channel(&self, channel_id: impl Into<String>) -> Result<()> {
        self.command("BridgeRemoveChannel", |e| {
            e.bridge_remove_channel = Some(BridgeRemoveChannel { channel: channel_id.into() })
        })
        .await
    }

    pub async fn delete(&self) -> Result<()> {
        self.command("BridgeDelete", |_| {}).await
    }

    pub async fn moh(&self, class: impl Into<String>) -> Result<()> {
        self.command("BridgeMOH", |e| e.bridge_moh = Some(BridgeMoh { class: class.into() }))
            .await
    }

    pub async fn stop_moh(&self) -> Result<()> {
        self.command("BridgeStopMOH", |_| {}).await
    }

    pub async fn video_source(&self, channel_id: impl Into<String>) -> Result<()> {
        self.command("BridgeVideoSource", |e| {
            e.bridge_video_source = Some(BridgeVideoSource { channel: channel_id.into() })
        })
        .await
    }

    pub async fn video_source_delete(&self) -> Result<()> {
        self.command("BridgeVideoSourceDelete", |_| {}).await
    }

    /// Issue the playback request directly against the bridge; returns the
    /// created [`super::playback::PlaybackHandle`].
    pub async fn play(&self, playback_id: impl Into<String>, media_uri: impl Into<String>) -> Result<super::playback::PlaybackHandle> {
        let mut envelope = RequestEnvelope::bare("BridgePlay", self.key.clone());
        envelope.bridge_play = Some(BridgePlay {
            playback_id: playback_id.into(),
            media_uri: media_uri.into(),
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(super::playback::PlaybackHandle::new(self.rpc.clone(), key))
    }

    pub async fn data(&self) -> Result<BridgeData> {
        let envelope = RequestEnvelope::bare("BridgeData", self.key.clone());
        let data = self.rpc.data(&envelope).await?;
        data.bridge.ok_or(ClientError::Nil {
            subject: "BridgeData".to_string(),
            verb: "data",
        })
    }

    /// Confirm the bridge still exists and fetch its canonical key
    /// (grounded in `ibridge.Get`, kind `BridgeGet` via the `get` verb).
    pub async fn get(&self) -> Result<Key> {
        let envelope = RequestEnvelope::bare("BridgeGet", self.key.clone());
        self.rpc.get(&envelope).await
    }
}

/// Sibling channel keys for a bridge's participants, sharing the bridge's
/// `app`/`node` coordinates (§3).
pub fn channels_of(bridge_key: &Key, data: &BridgeData) -> Vec<Key> {
    data.channel_ids.iter().map(|id| bridge_key.derive(KeyKind::Channel, id.clone())).collect()
}

pub struct Bridges {
    rpc: Arc<RpcFacade>,
}

impl Bridges {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        Bridges { rpc }
    }

    pub fn get(&self, key: Key) -> BridgeHandle {
        BridgeHandle::new(self.rpc.clone(), key)
    }

    pub async fn create(&self, key: Key, bridge_type: impl Into<String>, name: impl Into<String>) -> Result<BridgeHandle> {
        let bridge_type = bridge_type.into();
        let name = name.into();
        let mut envelope = RequestEnvelope::bare("BridgeCreate", key);
        envelope.bridge_create = Some(BridgeCreate {
            r#type: bridge_type,
            name,
        });
        let result_key = self.rpc.create(&envelope).await?;
        Ok(BridgeHandle::new(self.rpc.clone(), result_key))
    }

    /// A bridge handle staged with a `Create` operation, executed on the
    /// first [`BridgeHandle::exec`] call (grounded in `ibridge.StageCreate`).
    pub fn stage_create(&self, key: Key, bridge_type: impl Into<String>, name: impl Into<String>) -> BridgeHandle {
        let rpc = self.rpc.clone();
        let bridge_type = bridge_type.into();
        let name = name.into();
        let create_key = key.clone();
        BridgeHandle {
            key,
            rpc: rpc.clone(),
            staged: StagedExec::staged(move || {
                Box::pin(async move {
                    let mut envelope = RequestEnvelope::bare("BridgeCreate", create_key);
                    envelope.bridge_create = Some(BridgeCreate {
                        r#type: bridge_type,
                        name,
                    });
                    rpc.create(&envelope).await?;
                    Ok(())
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;
    use std::time::Duration;

    fn key() -> Key {
        Key::new(KeyKind::Bridge, "b1").with_app("myapp").with_node("nA")
    }

    #[tokio::test]
    async fn add_channel_sends_default_options() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.command.nA", |_| Ok(b"{}".to_vec()));
        let rpc = Arc::new(RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3)));
        let handle = BridgeHandle::new(rpc, key());

        handle.add_channel("c1").await.unwrap();
        let calls = bus.recorded_calls();
        if let crate::testing::Recorded::Request { payload, .. } = &calls[0] {
            let sent: serde_json::Value = serde_json::from_slice(payload).unwrap();
            assert_eq!(sent["bridge_add_channel"]["channel"], "c1");
            assert_eq!(sent["bridge_add_channel"]["mute"], false);
        } else {
            panic!("expected a request");
        }
    }

    #[test]
    fn channels_of_shares_bridge_coordinates() {
        let bridge_key = key();
        let data = BridgeData {
            id: "b1".to_string(),
            channel_ids: vec!["c1".to_string(), "c2".to_string()],
            ..Default::default()
        };
        let siblings = channels_of(&bridge_key, &data);
        assert_eq!(siblings.len(), 2);
        assert_eq!(siblings[0].app(), Some("myapp"));
        assert_eq!(siblings[0].node(), Some("nA"));
        assert_eq!(siblings[0].id(), Some("c1"));
    }

    #[tokio::test]
    async fn get_issues_bridge_get_and_returns_key() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.get.nA", |_| {
            Ok(br#"{"key":{"kind":"bridge","id":"b1","node":"nA","app":"myapp"}}"#.to_vec())
        });
        let rpc = Arc::new(RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3)));
        let handle = BridgeHandle::new(rpc, key());

        let returned = handle.get().await.unwrap();
        assert_eq!(returned.id(), Some("b1"));
        let calls = bus.recorded_calls();
        if let crate::testing::Recorded::Request { subject, payload } = &calls[0] {
            assert_eq!(subject, "ari.myapp.get.nA");
            let sent: serde_json::Value = serde_json::from_slice(payload).unwrap();
            assert_eq!(sent["kind"], "BridgeGet");
        } else {
            panic!("expected a request");
        }
    }

    #[tokio::test]
    async fn stage_create_defers_until_exec() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.create.nA", |_| {
            Ok(br#"{"key":{"kind":"bridge","id":"b1","node":"nA","app":"myapp"}}"#.to_vec())
        });
        let rpc = Arc::new(RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3)));
        let bridges = Bridges::new(rpc);

        let staged = bridges.stage_create(key(), "mixing", "b1");
        assert_eq!(bus.request_count(), 0);
        staged.exec().await.unwrap();
        assert_eq!(bus.request_count(), 1);
    }
}
