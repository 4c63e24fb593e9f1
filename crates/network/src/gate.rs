//! # Connection Gate
//!
//! Drives one client connection from its first byte to a terminal
//! [`ConnectionOutcome`].
//!
//! # Flow
//!
//! ```text
//! read handshake ──┬── status ──┬── override ──► respond locally ──► HandledLocally
//!                  │            └── otherwise ─► dial, replay ─────► Forward(Status)
//!                  │
//!                  └── login ───► read login start
//!                                 ├── capacity / name check fails ─► kick ─► Rejected
//!                                 └── admitted ─► dial, rewrite ──────────► Forward(Login)
//! ```
//!
//! The backend is dialed only after every local check passed. Any error
//! drops the client, so a client whose backend is unreachable sees the
//! connection close without a single byte.
//!
//! The gate does not enforce a deadline; the listener wraps [`ConnectionGate::handle`]
//! in a timeout.

use crate::counter::ActiveCount;
use crate::dialer::Dialer;
use crate::login::{kick, Admission, LoginGate};
use crate::outcome::{ConnectionOutcome, Session, SessionKind};
use crate::rewrite::HostRewriter;
use crate::status::StatusResponder;
use crate::stream::ClientStream;
use mcproxy_access::ListMembership;
use mcproxy_config::ServiceProfile;
use mcproxy_core::{ConnectionId, ProxyError, Result};
use mcproxy_protocol::{Handshake, LoginStart, Packet};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Per-service connection gate
///
/// Shared by all connection tasks of one listener. Holds no per-connection
/// state.
pub struct ConnectionGate<D: Dialer> {
    service: Arc<ServiceProfile>,
    dialer: Arc<D>,
    status: StatusResponder,
    login: LoginGate,
    rewriter: HostRewriter,
    linger: Option<Duration>,
}

impl<D: Dialer> ConnectionGate<D> {
    /// Create a gate for `service`
    ///
    /// # Arguments
    /// * `dialer` - Opens backend connections
    /// * `lists` - Named access lists the service's name check consults
    /// * `online` - Live session count, for capacity checks and MOTD numbers
    /// * `linger` - SO_LINGER for kicked clients, `None` to leave the default
    pub fn new(
        service: Arc<ServiceProfile>,
        dialer: Arc<D>,
        lists: Arc<dyn ListMembership>,
        online: Arc<dyn ActiveCount>,
        linger: Option<Duration>,
    ) -> Self {
        Self {
            status: StatusResponder::new(Arc::clone(&service), Arc::clone(&online)),
            login: LoginGate::new(Arc::clone(&service), lists, online),
            rewriter: HostRewriter::new(&service),
            service,
            dialer,
            linger,
        }
    }

    pub fn service(&self) -> &ServiceProfile {
        &self.service
    }

    /// Run a freshly accepted client through the gate
    ///
    /// Consumes the client. It comes back inside
    /// [`ConnectionOutcome::Forward`]; for every other outcome it has been
    /// closed.
    pub async fn handle<C: ClientStream>(
        &self,
        client: C,
        conn: ConnectionId,
    ) -> ConnectionOutcome<C, D::Stream> {
        let outcome = match self.process(client, conn).await {
            Ok(outcome) => outcome,
            Err(e) => ConnectionOutcome::Failed(e),
        };

        if outcome.is_success() {
            tracing::debug!("Connection {} [{}]: {}", conn, self.service.name, outcome.label());
        } else if let ConnectionOutcome::Failed(e) = &outcome {
            if matches!(e, ProxyError::Io(_)) {
                tracing::debug!("Connection {} [{}]: closed during handshake: {}", conn, self.service.name, e);
            } else {
                tracing::warn!("Connection {} [{}]: {}", conn, self.service.name, e);
            }
        }
        outcome
    }

    async fn process<C: ClientStream>(
        &self,
        mut client: C,
        conn: ConnectionId,
    ) -> Result<ConnectionOutcome<C, D::Stream>> {
        let frame = Packet::read_from(&mut client).await?;
        let handshake = Handshake::decode(&frame)?;

        tracing::debug!(
            "Connection {} [{}]: handshake protocol={} host={:?} port={} next={}",
            conn,
            self.service.name,
            handshake.protocol_version,
            handshake.server_address,
            handshake.server_port,
            handshake.next_state.as_str()
        );

        if handshake.next_state.is_login() {
            self.handle_login(client, &handshake, conn).await
        } else if self.status.is_synthesized() {
            self.status.respond(client, &handshake).await?;
            Ok(ConnectionOutcome::HandledLocally)
        } else {
            let session = self.status.passthrough(client, &*self.dialer, &frame).await?;
            Ok(ConnectionOutcome::Forward(session))
        }
    }

    async fn handle_login<C: ClientStream>(
        &self,
        mut client: C,
        handshake: &Handshake,
        conn: ConnectionId,
    ) -> Result<ConnectionOutcome<C, D::Stream>> {
        let packet = Packet::read_from(&mut client).await?;
        let player = LoginStart::decode(&packet)?.player_name;

        let decision = match self.login.admit(&player) {
            Admission::Admit(decision) => decision,
            Admission::Kick { reason, message } => {
                tracing::info!(
                    "Connection {} [{}]: player {} rejected: {}",
                    conn,
                    self.service.name,
                    player,
                    reason
                );
                if let Err(e) = kick(client, message, self.linger).await {
                    tracing::debug!("Connection {} [{}]: failed to send disconnect: {}", conn, self.service.name, e);
                }
                return Ok(ConnectionOutcome::Rejected(reason));
            }
        };

        tracing::info!(
            "Connection {} [{}]: player {} admitted ({})",
            conn,
            self.service.name,
            player,
            decision
        );

        let address = self.service.target();
        let mut backend = self
            .dialer
            .dial(&address)
            .await
            .map_err(|source| ProxyError::Dial { address, source })?;

        self.rewriter.rewrite(handshake).encode().write_to(&mut backend).await?;
        packet.write_to(&mut backend).await?;
        backend.flush().await?;

        Ok(ConnectionOutcome::Forward(Session {
            client,
            backend,
            kind: SessionKind::Login,
            player: Some(player),
        }))
    }
}
