//! Stored-recording handle (§4.H), grounded in `recordings.StoredRecordingHandle`
//! and `storedrecordings.go`'s `iStoredRecording`.

use std::sync::Arc;

use crate::envelope::{RecordingStoredCopy, RequestEnvelope, StoredRecordingData};
use crate::error::{ClientError, Result};
use crate::key::Key;
use crate::rpc::RpcFacade;

pub struct StoredRecordingHandle {
    key: Key,
    rpc: Arc<RpcFacade>,
}

impl StoredRecordingHandle {
    pub(crate) fn new(rpc: Arc<RpcFacade>, key: Key) -> Self {
        StoredRecordingHandle { key, rpc }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id().unwrap_or_default()
    }

    pub async fn data(&self) -> Result<StoredRecordingData> {
        let envelope = RequestEnvelope::bare("RecordingStoredData", self.key.clone());
        let data = self.rpc.data(&envelope).await?;
        data.stored_recording.ok_or(ClientError::Nil {
            subject: "RecordingStoredData".to_string(),
            verb: "data",
        })
    }

    /// Copy this recording to `destination`, returning a handle to the copy
    /// regardless of whether the command itself failed (§4.H, grounded in
    /// `iStoredRecording.Copy`, which always returns a handle alongside any
    /// error).
    pub async fn copy(&self, destination: impl Into<String>) -> (StoredRecordingHandle, Result<()>) {
        let destination = destination.into();
        let copy_key = self.key.derive(crate::key::KeyKind::StoredRecording, destination.clone());
        let mut envelope = RequestEnvelope::bare("RecordingStoredCopy", self.key.clone());
        envelope.recording_stored_copy = Some(RecordingStoredCopy { destination });
        let result = self.rpc.command(&envelope).await;
        (StoredRecordingHandle::new(self.rpc.clone(), copy_key), result)
    }

    pub async fn delete(&self) -> Result<()> {
        let envelope = RequestEnvelope::bare("RecordingStoredDelete", self.key.clone());
        self.rpc.command(&envelope).await
    }
}

pub struct StoredRecordings {
    rpc: Arc<RpcFacade>,
}

impl StoredRecordings {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        StoredRecordings { rpc }
    }

    pub fn get(&self, key: Key) -> StoredRecordingHandle {
        StoredRecordingHandle::new(self.rpc.clone(), key)
    }

    pub async fn list(&self, filter: Key) -> Result<Vec<Key>> {
        let envelope = RequestEnvelope::bare("RecordingStoredList", filter);
        self.rpc.list(&envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use crate::testing::MockBus;
    use std::time::Duration;

    #[tokio::test]
    async fn copy_returns_handle_even_on_error() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply("ari.myapp.command.nA", |_| Ok(br#"{"error":"disk full"}"#.to_vec()));
        let rpc = Arc::new(RpcFacade::new(bus, "ari", Duration::from_secs(3)));
        let key = Key::new(KeyKind::StoredRecording, "rec1").with_app("myapp").with_node("nA");
        let handle = StoredRecordingHandle::new(rpc, key);

        let (copy, result) = handle.copy("rec1-backup").await;
        assert!(result.is_err());
        assert_eq!(copy.id(), "rec1-backup");
    }
}
