//! Live-recording handle (§4.H), grounded in `recordings.LiveRecordingHandle`
//! and `liverecording.go`'s `iLifeRecording`.

use std::sync::Arc;

use crate::envelope::{LiveRecordingData, RequestEnvelope};
use crate::error::{ClientError, Result};
use crate::key::{Key, KeyKind};
use crate::rpc::RpcFacade;

use super::stored_recording::StoredRecordingHandle;

pub struct LiveRecordingHandle {
    key: Key,
    rpc: Arc<RpcFacade>,
}

impl LiveRecordingHandle {
    pub(crate) fn new(rpc: Arc<RpcFacade>, key: Key) -> Self {
        LiveRecordingHandle { key, rpc }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id().unwrap_or_default()
    }

    async fn command(&self, kind: &str) -> Result<()> {
        let envelope = RequestEnvelope::bare(kind, self.key.clone());
        self.rpc.command(&envelope).await
    }

    pub async fn data(&self) -> Result<LiveRecordingData> {
        let envelope = RequestEnvelope::bare("RecordingLiveData", self.key.clone());
        let data = self.rpc.data(&envelope).await?;
        data.live_recording.ok_or(ClientError::Nil {
            subject: "RecordingLiveData".to_string(),
            verb: "data",
        })
    }

    pub async fn stop(&self) -> Result<()> {
        self.command("RecordingLiveStop").await
    }

    pub async fn pause(&self) -> Result<()> {
        self.command("RecordingLivePause").await
    }

    pub async fn resume(&self) -> Result<()> {
        self.command("RecordingLiveResume").await
    }

    pub async fn mute(&self) -> Result<()> {
        self.command("RecordingLiveMute").await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.command("RecordingLiveUnmute").await
    }

    pub async fn scrap(&self) -> Result<()> {
        self.command("RecordingLiveScrap").await
    }

    /// The stored-recording handle for the same name (§4.H).
    pub fn stored(&self) -> StoredRecordingHandle {
        StoredRecordingHandle::new(self.rpc.clone(), self.key.derive(KeyKind::StoredRecording, self.id().to_string()))
    }
}

pub struct LiveRecordings {
    rpc: Arc<RpcFacade>,
}

impl LiveRecordings {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        LiveRecordings { rpc }
    }

    pub fn get(&self, key: Key) -> LiveRecordingHandle {
        LiveRecordingHandle::new(self.rpc.clone(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;
    use std::time::Duration;

    #[tokio::test]
    async fn stored_derives_sibling_key() {
        let bus = Arc::new(MockBus::new());
        let rpc = Arc::new(RpcFacade::new(bus, "ari", Duration::from_secs(3)));
        let key = Key::new(KeyKind::LiveRecording, "rec1").with_app("myapp").with_node("nA");
        let handle = LiveRecordingHandle::new(rpc, key);

        let stored = handle.stored();
        assert_eq!(stored.key().kind(), Some(KeyKind::StoredRecording));
        assert_eq!(stored.key().id(), Some("rec1"));
        assert_eq!(stored.key().app(), Some("myapp"));
    }
}
