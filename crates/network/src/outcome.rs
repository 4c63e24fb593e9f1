//! Result of running a connection through the gate

use crate::login::AccessDecision;
use mcproxy_core::ProxyError;
use std::fmt;

/// Terminal outcome of [`ConnectionGate::handle`](crate::ConnectionGate::handle)
///
/// Exactly one variant is produced per connection. Only `Forward` hands
/// sockets back to the caller; for every other variant the gate has already
/// closed the client connection and no backend connection is left open.
#[derive(Debug)]
pub enum ConnectionOutcome<C, B> {
    /// Backend dialed and primed, ready for raw relay
    Forward(Session<C, B>),

    /// Status request answered by the proxy itself
    HandledLocally,

    /// Login refused by policy; the client got a disconnect packet
    Rejected(RejectReason),

    /// Connection aborted
    Failed(ProxyError),
}

impl<C, B> ConnectionOutcome<C, B> {
    /// Short label for logs and tests
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward(_) => "forward",
            Self::HandledLocally => "handled-locally",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the connection was dealt with as intended (not an error)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// What a forwarded session was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Status request proxied to the backend
    Status,
    /// Player login
    Login,
}

/// A client paired with its primed backend connection
#[derive(Debug)]
pub struct Session<C, B> {
    pub client: C,
    pub backend: B,
    pub kind: SessionKind,

    /// Player name, for login sessions
    pub player: Option<String>,
}

/// Why a login was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Live player count reached the configured maximum
    ServerFull,

    /// Name-list check refused the player (`Deny` or `Reject`)
    NameAccess(AccessDecision),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerFull => f.write_str("server full"),
            Self::NameAccess(decision) => write!(f, "name access {}", decision),
        }
    }
}
