//! Channel handle (§4.H), grounded in `channel.go`'s `ChannelHandle` and
//! `ari.go`'s `ichannel` — the richest resource in the original, and the one
//! `Exec`-staging was designed around (`StageOriginate`/`StageSnoop`).

use std::sync::Arc;

use crate::envelope::{
    ChannelContinue, ChannelCreate, ChannelCreateRequest, ChannelData, ChannelDial, ChannelExternalMedia,
    ChannelHangup, ChannelMoh, ChannelMute, ChannelOriginate, ChannelPlay, ChannelRecord, ChannelSendDtmf,
    ChannelSnoop, ChannelVariable, Direction, DtmfOptions, ExternalMediaOptions, OriginateRequest, RecordingOptions,
    RequestEnvelope, SnoopOptions,
};
use crate::error::{ClientError, Result};
use crate::key::{Key, KeyKind};
use crate::rpc::RpcFacade;

use super::live_recording::LiveRecordingHandle;
use super::playback::PlaybackHandle;
use super::staged::StagedExec;

/// Handle to a single channel. Every method either performs its RPC
/// immediately or, for the `stage_*` variants, defers it behind
/// [`ChannelHandle::exec`] (§8 property 4).
pub struct ChannelHandle {
    key: Key,
    rpc: Arc<RpcFacade>,
    staged: StagedExec,
}

impl ChannelHandle {
    pub(crate) fn new(rpc: Arc<RpcFacade>, key: Key) -> Self {
        ChannelHandle {
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

    /// Run the staged callback, if any, at most once.
    pub async fn exec(&self) -> Result<()> {
        self.staged.exec().await
    }

    async fn command(&self, kind: &str, f: impl FnOnce(&mut RequestEnvelope)) -> Result<()> {
        let mut envelope = RequestEnvelope::bare(kind, self.key.clone());
        f(&mut envelope);
        self.rpc.command(&envelope).await
    }

    pub async fn answer(&self) -> Result<()> {
        self.command("ChannelAnswer", |_| {}).await
    }

    pub async fn hangup(&self, reason: impl Into<String>) -> Result<()> {
        self.command("ChannelHangup", |e| e.channel_hangup = Some(ChannelHangup { reason: reason.into() }))
            .await
    }

    pub async fn busy(&self) -> Result<()> {
        self.command("ChannelBusy", |_| {}).await
    }

    pub async fn congestion(&self) -> Result<()> {
        self.command("ChannelCongestion", |_| {}).await
    }

    pub async fn ring(&self) -> Result<()> {
        self.command("ChannelRing", |_| {}).await
    }

    pub async fn stop_ring(&self) -> Result<()> {
        self.command("ChannelStopRing", |_| {}).await
    }

    pub async fn hold(&self) -> Result<()> {
        self.command("ChannelHold", |_| {}).await
    }

    pub async fn stop_hold(&self) -> Result<()> {
        self.command("ChannelStopHold", |_| {}).await
    }

    /// `dir` defaults to inbound when unspecified (§4.H).
    pub async fn mute(&self, dir: Direction) -> Result<()> {
        self.command("ChannelMute", |e| e.channel_mute = Some(ChannelMute { direction: Some(dir) }))
            .await
    }

    pub async fn unmute(&self, dir: Direction) -> Result<()> {
        self.command("ChannelUnmute", |e| e.channel_mute = Some(ChannelMute { direction: Some(dir) }))
            .await
    }

    pub async fn moh(&self, class: impl Into<String>) -> Result<()> {
        self.command("ChannelMOH", |e| e.channel_moh = Some(ChannelMoh { music: class.into() }))
            .await
    }

    pub async fn stop_moh(&self) -> Result<()> {
        self.command("ChannelStopMOH", |_| {}).await
    }

    pub async fn silence(&self) -> Result<()> {
        self.command("ChannelSilence", |_| {}).await
    }

    pub async fn stop_silence(&self) -> Result<()> {
        self.command("ChannelStopSilence", |_| {}).await
    }

    pub async fn continue_in_dialplan(
        &self,
        context: impl Into<String>,
        extension: impl Into<String>,
        priority: i64,
    ) -> Result<()> {
        self.command("ChannelContinue", |e| {
            e.channel_continue = Some(ChannelContinue {
                context: context.into(),
                extension: extension.into(),
                priority,
            })
        })
        .await
    }

    pub async fn dial(&self, caller: impl Into<String>, timeout: std::time::Duration) -> Result<()> {
        self.command("ChannelDial", |e| {
            e.channel_dial = Some(ChannelDial {
                caller: caller.into(),
                timeout,
            })
        })
        .await
    }

    pub async fn send_dtmf(&self, dtmf: impl Into<String>, options: Option<DtmfOptions>) -> Result<()> {
        self.command("ChannelSendDTMF", |e| {
            e.channel_send_dtmf = Some(ChannelSendDtmf {
                dtmf: dtmf.into(),
                options,
            })
        })
        .await
    }

    pub async fn get_variable(&self, name: impl Into<String>) -> Result<String> {
        let envelope_key = self.key.clone();
        let mut envelope = RequestEnvelope::bare("ChannelVariableGet", envelope_key);
        envelope.channel_variable = Some(ChannelVariable {
            name: name.into(),
            value: String::new(),
        });
        let data = self.rpc.data(&envelope).await?;
        data.variable.ok_or(ClientError::Nil {
            subject: "ChannelVariableGet".to_string(),
            verb: "data",
        })
    }

    pub async fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.command("ChannelVariableSet", |e| {
            e.channel_variable = Some(ChannelVariable {
                name: name.into(),
                value: value.into(),
            })
        })
        .await
    }

    pub async fn data(&self) -> Result<ChannelData> {
        let envelope = RequestEnvelope::bare("ChannelData", self.key.clone());
        let data = self.rpc.data(&envelope).await?;
        data.channel.ok_or(ClientError::Nil {
            subject: "ChannelData".to_string(),
            verb: "data",
        })
    }

    pub async fn is_answered(&self) -> Result<bool> {
        Ok(self.data().await?.state.eq_ignore_ascii_case("up"))
    }

    pub async fn play(&self, playback_id: impl Into<String>, media_uri: impl Into<String>) -> Result<PlaybackHandle> {
        let mut envelope = RequestEnvelope::bare("ChannelPlay", self.key.clone());
        envelope.channel_play = Some(ChannelPlay {
            playback_id: playback_id.into(),
            media_uri: media_uri.into(),
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(PlaybackHandle::new(self.rpc.clone(), key))
    }

    pub async fn record(&self, name: impl Into<String>, options: Option<RecordingOptions>) -> Result<LiveRecordingHandle> {
        let mut envelope = RequestEnvelope::bare("ChannelRecord", self.key.clone());
        envelope.channel_record = Some(crate::envelope::ChannelRecord {
            name: name.into(),
            options,
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(LiveRecordingHandle::new(self.rpc.clone(), key))
    }

    pub async fn snoop(&self, snoop_id: impl Into<String>, options: Option<SnoopOptions>) -> Result<ChannelHandle> {
        let snoop_id = snoop_id.into();
        let mut envelope = RequestEnvelope::bare("ChannelSnoop", self.key.clone());
        envelope.channel_snoop = Some(ChannelSnoop {
            snoop_id: snoop_id.clone(),
            options,
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(ChannelHandle::new(self.rpc.clone(), key.derive(KeyKind::Channel, snoop_id)))
    }

    /// Stage a [`Self::snoop`] to run on the first [`Self::exec`] call.
    pub fn stage_snoop(&self, snoop_id: impl Into<String>, options: Option<SnoopOptions>) -> ChannelHandle {
        let snoop_id = snoop_id.into();
        let rpc = self.rpc.clone();
        let key = self.key.clone();
        let placeholder = key.derive(KeyKind::Channel, snoop_id.clone());
        ChannelHandle {
            key: placeholder,
            rpc: rpc.clone(),
            staged: StagedExec::staged(move || {
                Box::pin(async move {
                    ChannelHandle::new(rpc, key).snoop(snoop_id, options).await?;
                    Ok(())
                })
            }),
        }
    }

    pub async fn originate(&self, request: OriginateRequest) -> Result<ChannelHandle> {
        let mut envelope = RequestEnvelope::bare("ChannelOriginate", self.key.clone());
        envelope.channel_originate = Some(ChannelOriginate {
            originate_request: request,
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(ChannelHandle::new(self.rpc.clone(), key))
    }

    /// Stage an [`Self::originate`] to run on the first [`Self::exec`] call.
    pub fn stage_originate(&self, request: OriginateRequest) -> ChannelHandle {
        let rpc = self.rpc.clone();
        let key = self.key.clone();
        ChannelHandle {
            key: self.key.clone(),
            rpc: rpc.clone(),
            staged: StagedExec::staged(move || {
                Box::pin(async move {
                    ChannelHandle::new(rpc, key).originate(request).await?;
                    Ok(())
                })
            }),
        }
    }

    pub async fn create(&self, mut request: ChannelCreateRequest) -> Result<ChannelHandle> {
        if request.originator.is_none() {
            request.originator = Some(self.id().to_string());
        }
        let channel_id = request.channel_id.clone().unwrap_or_default();
        let mut envelope = RequestEnvelope::bare("ChannelCreate", self.key.clone());
        envelope.channel_create = Some(ChannelCreate {
            channel_create_request: request,
        });
        let key = self.rpc.create(&envelope).await?;
        Ok(ChannelHandle::new(self.rpc.clone(), key.derive(KeyKind::Channel, channel_id)))
    }

    pub async fn external_media(&self, options: ExternalMediaOptions) -> Result<ChannelHandle> {
        let mut envelope = RequestEnvelope::bare("ChannelExternalMedia", self.key.clone());
        envelope.channel_external_media = Some(ChannelExternalMedia { options });
        let key = self.rpc.create(&envelope).await?;
        Ok(ChannelHandle::new(self.rpc.clone(), key))
    }
}

/// Cluster-wide channel operations that don't need an existing handle
/// (§4.H; mirrors `ichannel` in the original proxy client).
pub struct Channels {
    rpc: Arc<RpcFacade>,
}

impl Channels {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        Channels { rpc }
    }

    pub fn get(&self, key: Key) -> ChannelHandle {
        ChannelHandle::new(self.rpc.clone(), key)
    }

    pub async fn create(&self, key: Key, request: ChannelCreateRequest) -> Result<ChannelHandle> {
        ChannelHandle::new(self.rpc.clone(), key).create(request).await
    }

    pub async fn originate(&self, key: Key, request: OriginateRequest) -> Result<ChannelHandle> {
        ChannelHandle::new(self.rpc.clone(), key).originate(request).await
    }
}
