//! # mcproxy Networking Layer
//!
//! Tokio-based connection handling for the proxy: the per-connection gate
//! that runs the Minecraft handshake/login exchange, and the listener that
//! feeds it and relays admitted sessions.
//!
//! ## Modules
//!
//! - [`config`] - Timeouts and socket options
//! - [`gate`] - Per-connection state machine, produces a [`ConnectionOutcome`]
//! - [`status`] - Server list ping, proxied or answered locally
//! - [`login`] - Capacity and name-list admission checks
//! - [`rewrite`] - Hostname rewriting for forwarded handshakes
//! - [`dialer`] - Backend connection factory
//! - [`counter`] - Live session counting
//! - [`stream`] - Client socket abstraction (SO_LINGER support)
//! - [`server`] - Listeners, task tracking and byte relay

pub mod config;
pub mod counter;
pub mod dialer;
pub mod gate;
pub mod login;
pub mod outcome;
pub mod rewrite;
pub mod server;
pub mod status;
pub mod stream;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use config::NetworkConfig;
pub use counter::{ActiveCount, OnlineGuard, ServiceCounter};
pub use dialer::{Dialer, DirectDialer};
pub use gate::ConnectionGate;
pub use login::{kick, AccessDecision, Admission, LoginGate};
pub use outcome::{ConnectionOutcome, RejectReason, Session, SessionKind};
pub use rewrite::{HostRewriter, FML_SUFFIX};
pub use server::ProxyServer;
pub use status::StatusResponder;
pub use stream::ClientStream;
