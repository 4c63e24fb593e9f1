//! Shared test doubles

use crate::dialer::Dialer;
use crate::stream::ClientStream;
use async_trait::async_trait;
use mcproxy_access::ListMembership;
use mcproxy_config::{MinecraftSettings, ServiceProfile};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::time::Duration;
use tokio::io::DuplexStream;

impl ClientStream for DuplexStream {
    fn close_lingering(self, _linger: Option<Duration>) {}
}

/// Service with default Minecraft settings, backend on port 25566
pub fn profile() -> ServiceProfile {
    ServiceProfile {
        name: "lobby".to_string(),
        listen: "127.0.0.1:25565".parse().unwrap(),
        target_address: "127.0.0.1".to_string(),
        target_port: 25566,
        minecraft: MinecraftSettings::default(),
    }
}

/// In-memory lists that record every lookup in order
pub struct RecordingLists {
    lists: HashMap<String, HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingLists {
    pub fn new(lists: &[(&str, &[&str])]) -> Self {
        Self {
            lists: lists
                .iter()
                .map(|(name, players)| {
                    let players = players.iter().map(|p| p.to_string()).collect();
                    (name.to_string(), players)
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Names of the lists consulted so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ListMembership for RecordingLists {
    fn is_member(&self, list: &str, player: &str) -> bool {
        self.calls.lock().push(list.to_string());
        self.lists
            .get(list)
            .map(|players| players.contains(player))
            .unwrap_or(false)
    }
}

/// Dialer handing out in-memory backends
///
/// The backend's end of every dialed pipe is kept so tests can inspect what
/// the proxy sent.
#[derive(Default)]
pub struct MockDialer {
    fail: bool,
    dialed: Mutex<Vec<String>>,
    backends: Mutex<Vec<DuplexStream>>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dialer whose every attempt is refused
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().clone()
    }

    /// Backend side of the most recent dial
    pub fn take_backend(&self) -> Option<DuplexStream> {
        self.backends.lock().pop()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Stream = DuplexStream;

    async fn dial(&self, address: &str) -> io::Result<DuplexStream> {
        self.dialed.lock().push(address.to_string());
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "backend down"));
        }
        let (proxy_side, backend_side) = tokio::io::duplex(64 * 1024);
        self.backends.lock().push(backend_side);
        Ok(proxy_side)
    }
}
