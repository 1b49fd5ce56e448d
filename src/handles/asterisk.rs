//! Asterisk-info handle (§4.H), grounded in `asterisk.go`'s `iasterisk` — a
//! stateless, single-operation wrapper with no staged variants and no
//! lifecycle of its own.

use std::sync::Arc;

use crate::envelope::{AsteriskInfo, RequestEnvelope};
use crate::error::{ClientError, Result};
use crate::key::Key;
use crate::rpc::RpcFacade;

pub struct Asterisk {
    rpc: Arc<RpcFacade>,
}

impl Asterisk {
    pub(crate) fn new(rpc: Arc<RpcFacade>) -> Self {
        Asterisk { rpc }
    }

    /// `key` must be coordinate-complete (node and app both set).
    pub async fn info(&self, key: Key) -> Result<AsteriskInfo> {
        let envelope = RequestEnvelope::bare("AsteriskInfo", key);
        let data = self.rpc.data(&envelope).await?;
        data.asterisk.ok_or(ClientError::Nil {
            subject: "AsteriskInfo".to_string(),
            verb: "data",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use crate::testing::MockBus;
    use std::time::Duration;

    #[tokio::test]
    async fn info_requires_coordinate_complete_key() {
        let bus = Arc::new(MockBus::new());
        let rpc = Arc::new(RpcFacade::new(bus, "ari", Duration::from_secs(3)));
        let asterisk = Asterisk::new(rpc);

        let incomplete = Key::new(KeyKind::Application, "app1");
        let err = asterisk.info(incomplete).await.unwrap_err();
        assert!(matches!(err, crate::error::ClientError::IncompleteCoordinates { .. }));
    }
}
