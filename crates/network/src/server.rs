//! # Proxy Server
//!
//! Owns one TCP listener per configured service and drives every accepted
//! connection through its service's [`ConnectionGate`].
//!
//! # Architecture
//!
//! ## Components
//!
//! 1. **Listeners** - One accept loop per service
//! 2. **Gates** - One [`ConnectionGate`] per service, shared by its connection tasks
//! 3. **Counters** - One [`ServiceCounter`] per service, tracking relayed logins
//! 4. **ID Generator** - Assigns process-wide connection IDs for log correlation
//!
//! ## Connection lifecycle
//!
//! ```text
//! 1. Accept, assign ID, set TCP_NODELAY
//! 2. Spawn a task on the tracker
//! 3. Run the gate under the handshake deadline
//! 4. On Forward: relay bytes both ways until either side closes
//! ```
//!
//! Login sessions hold an [`OnlineGuard`](crate::counter::OnlineGuard) while
//! relaying, so the count drops back as soon as the player disconnects.
//!
//! # Shutdown
//!
//! Cancelling the token returned by [`ProxyServer::shutdown_token`] stops all
//! accept loops and tears down every in-flight connection. [`ProxyServer::run`]
//! returns once all tasks have finished.

use crate::config::NetworkConfig;
use crate::counter::ServiceCounter;
use crate::dialer::DirectDialer;
use crate::gate::ConnectionGate;
use crate::outcome::{ConnectionOutcome, Session, SessionKind};
use mcproxy_access::ListMembership;
use mcproxy_config::ServiceProfile;
use mcproxy_core::{ConnectionId, IdGenerator, ProxyError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Delay before retrying after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound service, ready to accept
struct ServiceListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    gate: Arc<ConnectionGate<DirectDialer>>,
    counter: Arc<ServiceCounter>,
}

impl ServiceListener {
    fn name(&self) -> &str {
        &self.gate.service().name
    }
}

/// Multi-service Minecraft reverse proxy
pub struct ProxyServer {
    config: NetworkConfig,
    listeners: Vec<ServiceListener>,
    ids: Arc<IdGenerator>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl ProxyServer {
    /// Bind a listener for every service
    ///
    /// # Arguments
    /// * `config` - Timeouts and socket options
    /// * `services` - Services to expose
    /// * `lists` - Named access lists shared by all services
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a listen address
    /// cannot be bound.
    pub async fn bind(
        config: NetworkConfig,
        services: Vec<ServiceProfile>,
        lists: Arc<dyn ListMembership>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ProxyError::Config(format!("Invalid network configuration: {}", e)))?;

        let dialer = Arc::new(DirectDialer::new(config.dial_timeout, config.nodelay));
        let mut listeners = Vec::with_capacity(services.len());

        for service in services {
            let listener = TcpListener::bind(service.listen).await.map_err(|e| {
                ProxyError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to bind {} for service {}: {}", service.listen, service.name, e),
                ))
            })?;
            let local_addr = listener.local_addr()?;
            tracing::info!("Service {} listening on {} -> {}", service.name, local_addr, service.target());

            let counter = Arc::new(ServiceCounter::new());
            let gate = ConnectionGate::new(
                Arc::new(service),
                Arc::clone(&dialer),
                Arc::clone(&lists),
                counter.clone(),
                config.kick_linger(),
            );

            listeners.push(ServiceListener {
                listener,
                local_addr,
                gate: Arc::new(gate),
                counter,
            });
        }

        Ok(Self {
            config,
            listeners,
            ids: Arc::new(IdGenerator::new()),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }

    /// Bound address of every service, in configuration order
    pub fn local_addrs(&self) -> Vec<(String, SocketAddr)> {
        self.listeners
            .iter()
            .map(|l| (l.name().to_string(), l.local_addr))
            .collect()
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accept and serve connections until the shutdown token is cancelled
    pub async fn run(self) -> Result<()> {
        tracing::info!("Proxy starting with {} service(s)", self.listeners.len());

        for listener in self.listeners {
            let ctx = AcceptContext {
                config: self.config.clone(),
                ids: Arc::clone(&self.ids),
                shutdown: self.shutdown.clone(),
                tracker: self.tracker.clone(),
            };
            self.tracker.spawn(accept_loop(listener, ctx));
        }

        self.shutdown.cancelled().await;
        tracing::info!("Shutting down, waiting for {} task(s)", self.tracker.len());

        self.tracker.close();
        self.tracker.wait().await;

        tracing::info!("Proxy stopped");
        Ok(())
    }
}

/// Shared state handed to each accept loop
struct AcceptContext {
    config: NetworkConfig,
    ids: Arc<IdGenerator>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

async fn accept_loop(service: ServiceListener, ctx: AcceptContext) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,

            result = service.listener.accept() => {
                let (socket, addr) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::error!("Service {}: accept failed: {}", service.name(), e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };

                let conn = ctx.ids.next_id();
                tracing::debug!("Connection {} [{}]: accepted from {}", conn, service.name(), addr);

                if ctx.config.nodelay {
                    if let Err(e) = socket.set_nodelay(true) {
                        tracing::debug!("Connection {}: failed to set TCP_NODELAY: {}", conn, e);
                    }
                }

                let gate = Arc::clone(&service.gate);
                let counter = Arc::clone(&service.counter);
                let deadline = ctx.config.handshake_timeout;
                let shutdown = ctx.shutdown.clone();

                ctx.tracker.spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::debug!("Connection {}: closed by shutdown", conn);
                        }
                        _ = serve_connection(gate, counter, socket, conn, deadline) => {}
                    }
                });
            }
        }
    }

    tracing::info!("Service {}: listener closed", service.name());
}

async fn serve_connection(
    gate: Arc<ConnectionGate<DirectDialer>>,
    counter: Arc<ServiceCounter>,
    socket: TcpStream,
    conn: ConnectionId,
    deadline: Duration,
) {
    let name = gate.service().name.clone();

    // Dropping the gate future on timeout drops the client socket with it
    let outcome = match tokio::time::timeout(deadline, gate.handle(socket, conn)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!("Connection {} [{}]: handshake timed out after {:?}", conn, name, deadline);
            return;
        }
    };

    if let ConnectionOutcome::Forward(session) = outcome {
        relay(session, &counter, conn, &name).await;
    }
}

/// Copy bytes both ways until either side closes
async fn relay(
    session: Session<TcpStream, TcpStream>,
    counter: &Arc<ServiceCounter>,
    conn: ConnectionId,
    service: &str,
) {
    let Session {
        mut client,
        mut backend,
        kind,
        player,
    } = session;

    let _online = (kind == SessionKind::Login).then(|| counter.enter());
    let who = player.as_deref().unwrap_or("status");

    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((to_backend, to_client)) => {
            if kind == SessionKind::Login {
                tracing::info!(
                    "Connection {} [{}]: player {} disconnected ({} bytes up, {} bytes down)",
                    conn,
                    service,
                    who,
                    to_backend,
                    to_client
                );
            } else {
                tracing::debug!("Connection {} [{}]: status relay finished", conn, service);
            }
        }
        Err(e) => {
            tracing::debug!("Connection {} [{}]: relay for {} ended: {}", conn, service, who, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::ActiveCount;
    use crate::testing::{profile, RecordingLists};
    use mcproxy_core::NextState;
    use mcproxy_protocol::{Handshake, LoginStart, Packet};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn start(
        config: NetworkConfig,
        backend: SocketAddr,
    ) -> (SocketAddr, Arc<ServiceCounter>, CancellationToken, tokio::task::JoinHandle<Result<()>>) {
        let mut service = profile();
        service.listen = "127.0.0.1:0".parse().unwrap();
        service.target_address = backend.ip().to_string();
        service.target_port = backend.port();

        let server = ProxyServer::bind(config, vec![service], Arc::new(RecordingLists::new(&[])))
            .await
            .unwrap();
        let addr = server.local_addrs()[0].1;
        let counter = Arc::clone(&server.listeners[0].counter);
        let token = server.shutdown_token();
        let handle = tokio::spawn(server.run());
        (addr, counter, token, handle)
    }

    #[tokio::test]
    async fn test_login_relayed_end_to_end() {
        let backend = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (proxy, counter, token, handle) =
            start(NetworkConfig::default(), backend.local_addr().unwrap()).await;

        let mut client = TcpStream::connect(proxy).await.unwrap();
        let handshake = Handshake {
            protocol_version: 763,
            server_address: "mc.example.com".to_string(),
            server_port: proxy.port(),
            next_state: NextState::Login,
        }
        .encode();
        let login = LoginStart {
            player_name: "Steve".to_string(),
        }
        .encode();
        handshake.write_to(&mut client).await.unwrap();
        login.write_to(&mut client).await.unwrap();

        let (mut upstream, _) = backend.accept().await.unwrap();
        let forwarded = Packet::read_from(&mut upstream).await.unwrap();
        assert_eq!(forwarded.frame(), handshake.frame());
        let forwarded = Packet::read_from(&mut upstream).await.unwrap();
        assert_eq!(forwarded.frame(), login.frame());

        // Raw relay in both directions
        upstream.write_all(b"welcome").await.unwrap();
        let mut buf = [0u8; 7];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"welcome");

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        upstream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        for _ in 0..100 {
            if counter.active() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(counter.active(), 1);

        drop(client);
        drop(upstream);
        for _ in 0..100 {
            if counter.active() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(counter.active(), 0);

        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_handshake_deadline_closes_idle_client() {
        let backend = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = NetworkConfig {
            handshake_timeout: Duration::from_millis(100),
            dial_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let (proxy, _counter, token, handle) = start(config, backend.local_addr().unwrap()).await;

        let mut client = TcpStream::connect(proxy).await.unwrap();
        let mut buf = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, 0);

        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = NetworkConfig {
            handshake_timeout: Duration::ZERO,
            ..Default::default()
        };
        let result = ProxyServer::bind(config, vec![profile()], Arc::new(RecordingLists::new(&[]))).await;
        assert!(matches!(result, Err(ProxyError::Config(_))));
    }
}
