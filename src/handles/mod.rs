//! Resource handles (component H): typed wrappers binding a [`crate::key::Key`]
//! to the RPC façade, one module per resource family (§4.H).

pub mod asterisk;
pub mod bridge;
pub mod channel;
pub mod live_recording;
pub mod playback;
mod staged;
pub mod stored_recording;

pub use asterisk::Asterisk;
pub use bridge::{BridgeAddChannelOptions, BridgeHandle, Bridges};
pub use channel::{ChannelHandle, Channels};
pub use live_recording::{LiveRecordingHandle, LiveRecordings};
pub use playback::{PlaybackHandle, Playbacks};
pub use stored_recording::{StoredRecordingHandle, StoredRecordings};
