//! # Status Responder
//!
//! Handles connections whose handshake asked for the status state (server
//! list ping). Two modes, picked per service:
//!
//! - **Passthrough** (no MOTD override): the backend answers. The proxy
//!   replays the handshake frame verbatim, sends a canonical status request
//!   and hands both sockets to the relay.
//! - **Synthesized** (description or favicon configured): the proxy answers
//!   with its own status response, echoes the ping and closes. The backend
//!   is never contacted.

use crate::counter::ActiveCount;
use crate::dialer::Dialer;
use crate::outcome::{Session, SessionKind};
use crate::stream::ClientStream;
use mcproxy_config::ServiceProfile;
use mcproxy_core::{ProxyError, Result};
use mcproxy_protocol::{
    version_label, Handshake, Packet, PlayerSample, StatusDescription, StatusPlayers,
    StatusResponse, StatusVersion, STATUS_REQUEST_FRAME,
};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Answers or forwards status requests for one service
pub struct StatusResponder {
    service: Arc<ServiceProfile>,
    online: Arc<dyn ActiveCount>,
}

impl StatusResponder {
    pub fn new(service: Arc<ServiceProfile>, online: Arc<dyn ActiveCount>) -> Self {
        Self { service, online }
    }

    /// Whether this service answers status requests itself
    pub fn is_synthesized(&self) -> bool {
        self.service.has_motd_override()
    }

    /// Build the status response shown to a client speaking `protocol`
    pub fn build_response(&self, protocol: i32) -> StatusResponse {
        let count = &self.service.minecraft.online_count;
        let online = if count.online >= 0 {
            count.online
        } else {
            i64::try_from(self.online.active()).unwrap_or(i64::MAX)
        };

        StatusResponse {
            version: StatusVersion {
                name: version_label(protocol),
                protocol,
            },
            players: StatusPlayers {
                max: count.max,
                online,
                sample: count.sample.iter().map(PlayerSample::line).collect(),
            },
            description: StatusDescription {
                text: self.service.minecraft.motd_description.clone(),
            },
            favicon: self.service.favicon().map(str::to_string),
        }
    }

    /// Answer the status exchange locally and close the client
    ///
    /// A client that disconnects instead of sending its ping has still been
    /// answered, so that case is not an error.
    pub async fn respond<C: ClientStream>(&self, mut client: C, handshake: &Handshake) -> Result<()> {
        let request = Packet::read_from(&mut client).await?;
        tracing::trace!("Discarding status request (id 0x{:02x})", request.id());

        let response = self.build_response(handshake.protocol_version).encode()?;
        response.write_to(&mut client).await?;
        client.flush().await?;

        match Packet::read_from(&mut client).await {
            Ok(ping) => {
                ping.write_to(&mut client).await?;
                client.flush().await?;
            }
            Err(ProxyError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                tracing::debug!("Client closed before sending a ping");
            }
            Err(e) => return Err(e),
        }

        let _ = client.shutdown().await;
        Ok(())
    }

    /// Forward the status exchange to the backend
    ///
    /// The client's own status request is read and dropped, not forwarded.
    /// The backend instead receives the original handshake frame followed by
    /// the canonical `[0x01, 0x00]` request, so the exchange is not byte-for-byte
    /// transparent: a status request carrying extra payload reaches the backend
    /// in its two-byte form. Everything after it (the ping) is relayed as is.
    pub async fn passthrough<C, D>(
        &self,
        mut client: C,
        dialer: &D,
        handshake_frame: &Packet,
    ) -> Result<Session<C, D::Stream>>
    where
        C: ClientStream,
        D: Dialer + ?Sized,
    {
        Packet::read_from(&mut client).await?;

        let address = self.service.target();
        let mut backend = dialer
            .dial(&address)
            .await
            .map_err(|source| ProxyError::Dial { address, source })?;

        handshake_frame.write_to(&mut backend).await?;
        backend.write_all(&STATUS_REQUEST_FRAME).await?;
        backend.flush().await?;

        Ok(Session {
            client,
            backend,
            kind: SessionKind::Status,
            player: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::profile;
    use mcproxy_core::NextState;

    fn responder(online: usize) -> StatusResponder {
        let mut service = profile();
        service.minecraft.motd_description = "Welcome\nSecond line".to_string();
        service.minecraft.online_count.max = 100;
        service.minecraft.online_count.sample = vec!["Event tonight".to_string()];
        StatusResponder::new(Arc::new(service), Arc::new(move || online))
    }

    #[test]
    fn test_build_response_live_count() {
        let responder = responder(42);
        assert!(responder.is_synthesized());

        let response = responder.build_response(763);
        assert_eq!(response.version.protocol, 763);
        assert_eq!(response.version.name, "1.20.1");
        assert_eq!(response.players.max, 100);
        assert_eq!(response.players.online, 42);
        assert_eq!(response.players.sample[0].name, "Event tonight");
        assert_eq!(response.description.text, "Welcome\nSecond line");
        assert_eq!(response.favicon, None);
    }

    #[test]
    fn test_build_response_fixed_count_unknown_protocol() {
        let mut service = profile();
        service.minecraft.motd_description = "x".to_string();
        service.minecraft.online_count.online = 7;
        let responder = StatusResponder::new(Arc::new(service), Arc::new(|| 99usize));

        let response = responder.build_response(123456);
        assert_eq!(response.players.online, 7);
        assert_eq!(response.version.protocol, 123456);
        assert!(!response.version.name.is_empty());
    }

    #[test]
    fn test_passthrough_without_override() {
        let responder = StatusResponder::new(Arc::new(profile()), Arc::new(|| 0usize));
        assert!(!responder.is_synthesized());
    }

    #[tokio::test]
    async fn test_respond_without_ping() {
        use tokio::io::AsyncReadExt;

        let responder = responder(0);
        let handshake = Handshake {
            protocol_version: 47,
            server_address: "a".into(),
            server_port: 1,
            next_state: NextState::Status,
        };

        let (proxy_side, mut client_side) = tokio::io::duplex(64 * 1024);
        client_side.write_all(&STATUS_REQUEST_FRAME).await.unwrap();
        client_side.shutdown().await.unwrap();

        responder.respond(proxy_side, &handshake).await.unwrap();

        let mut received = Vec::new();
        client_side.read_to_end(&mut received).await.unwrap();
        let packet = Packet::read_from(&mut &received[..]).await.unwrap();
        assert_eq!(packet.id(), 0x00);
        assert_eq!(packet.frame().len(), received.len());
    }
}
