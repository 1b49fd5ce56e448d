//! Playback handle (§4.H), grounded in `play`'s `PlaybackHandle` and
//! `playback.go`'s `playback` resource — the smallest handle in the
//! original, with no staged variants.

use std::sync::Arc;

use crate::envelope::{PlaybackControl, PlaybackData, RequestEnvelope};
use crate::error::{ClientError, Result};
use crate::key::Key;
use crate::rpc::RpcFacade;

pub struct PlaybackHandle {
    key: Key,
    rpc: Arc<RpcFacade>,
}

impl PlaybackHandle {
    pub(crate) fn new(rpc: Arc<RpcFacade>, key: Key) -> Self {
        PlaybackHandle { key, rpc }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id().unwrap_or_default()
    }

    pub async fn data(&self) -> Result<PlaybackData> {
        let envelope = RequestEnvelope::bare("PlaybackData", self.key.clone());
        let data = self.rpc.data(&envelope).await?;
        data.playback.ok_or(ClientError::Nil {
            subject: "PlaybackData".to_string(),
            verb: "data",
        })
    }

    /// `op` is one of `restart`, `pause`, `unpause`, `reverse`, `forward`.
    pub async fn control(&self, op: impl Into<String>) -> Result<()> {
        let mut envelope = RequestEnvelope::bare("PlaybackControl", self.key.clone());
        envelope.playback_control = Some(PlaybackControl { command: op.into() });
        self.rpc.command(&envelope).await
    }

    pub async fn stop(&self) -> Result<()> {
        let envelope = RequestEnvelope::bare("PlaybackStop", self.key.clone());
        self.rpc.command(&envelope).await
    }
}

pub struct Playbacks {
    rpc: Arc<RpcFacade>,
}

impl Playbacks {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        Playbacks { rpc }
    }

    pub fn get(&self, key: Key) -> PlaybackHandle {
        PlaybackHandle::new(self.rpc.clone(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use crate::testing::MockBus;
    use std::time::Duration;

    #[tokio::test]
    async fn control_sends_command() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.command.nA", |_| Ok(b"{}".to_vec()));
        let rpc = Arc::new(RpcFacade::new(bus.clone(), "ari", Duration::from_secs(3)));
        let key = Key::new(KeyKind::Playback, "p1").with_app("myapp").with_node("nA");
        let handle = PlaybackHandle::new(rpc, key);

        handle.control("pause").await.unwrap();
        let calls = bus.recorded_calls();
        if let crate::testing::Recorded::Request { payload, .. } = &calls[0] {
            let sent: serde_json::Value = serde_json::from_slice(payload).unwrap();
            assert_eq!(sent["playback_control"]["command"], "pause");
        } else {
            panic!("expected a request");
        }
    }
}
