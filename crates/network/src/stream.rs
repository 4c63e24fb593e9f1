//! Client stream abstraction

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// A client connection the gate can read from, write to and close
///
/// Besides plain I/O the gate needs a lingering close for kicked clients,
/// so the disconnect packet keeps being delivered for a bounded time after
/// the proxy let go of the socket.
pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// Close the connection, lingering up to `linger` for unsent data
    ///
    /// Must not block the calling task. `None` closes right away with the
    /// OS default behaviour.
    fn close_lingering(self, linger: Option<Duration>);
}

impl ClientStream for TcpStream {
    fn close_lingering(self, linger: Option<Duration>) {
        let Some(linger) = linger else {
            return;
        };

        let stream = match self.into_std() {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!("Failed to detach kicked client from the runtime: {}", e);
                return;
            }
        };

        // close() with SO_LINGER set blocks until the peer acknowledged
        // everything or the linger expires, so it runs on the blocking pool
        tokio::task::spawn_blocking(move || {
            if let Err(e) = socket2::SockRef::from(&stream).set_linger(Some(linger)) {
                tracing::debug!("Failed to set linger on kicked client: {}", e);
            }
            drop(stream);
        });
    }
}
