//! Handshake rewriting for forwarded logins
//!
//! Backends behind the proxy usually expect to see their own hostname and
//! port in the handshake. When rewriting is enabled the client's hostname is
//! replaced, keeping the Forge `\0FML\0` marker unless told to drop it, and
//! the port becomes the backend port.

use mcproxy_config::ServiceProfile;
use mcproxy_core::NextState;
use mcproxy_protocol::Handshake;

/// Marker Forge clients append to the hostname
pub const FML_SUFFIX: &str = "\0FML\0";

/// Builds the handshake sent to the backend for a login
#[derive(Debug, Clone)]
pub struct HostRewriter {
    enabled: bool,
    hostname: String,
    port: u16,
    ignore_fml_suffix: bool,
}

impl HostRewriter {
    pub fn new(service: &ServiceProfile) -> Self {
        let mc = &service.minecraft;
        Self {
            enabled: mc.enable_hostname_rewrite,
            hostname: mc.rewritten_hostname.clone(),
            port: service.target_port,
            ignore_fml_suffix: mc.ignore_fml_suffix,
        }
    }

    /// Handshake to forward for a login
    ///
    /// The next state is always `Login`, so a client that announced a
    /// transfer is presented to the backend as a regular login. Rewriting an
    /// already rewritten handshake gives the same result.
    pub fn rewrite(&self, original: &Handshake) -> Handshake {
        let (server_address, server_port) = if self.enabled {
            let mut host = self.hostname.clone();
            if !self.ignore_fml_suffix && original.server_address.ends_with(FML_SUFFIX) {
                host.push_str(FML_SUFFIX);
            }
            (host, self.port)
        } else {
            (original.server_address.clone(), original.server_port)
        };

        Handshake {
            protocol_version: original.protocol_version,
            server_address,
            server_port,
            next_state: NextState::Login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::profile;

    fn handshake(host: &str, next_state: NextState) -> Handshake {
        Handshake {
            protocol_version: 340,
            server_address: host.to_string(),
            server_port: 25565,
            next_state,
        }
    }

    fn rewriter(ignore_fml: bool) -> HostRewriter {
        let mut service = profile();
        service.target_port = 25566;
        service.minecraft.enable_hostname_rewrite = true;
        service.minecraft.rewritten_hostname = "backend.local".to_string();
        service.minecraft.ignore_fml_suffix = ignore_fml;
        HostRewriter::new(&service)
    }

    #[test]
    fn test_rewrite_keeps_fml_suffix() {
        let out = rewriter(false).rewrite(&handshake("mc.example.com\0FML\0", NextState::Login));
        assert_eq!(out.server_address, "backend.local\0FML\0");
        assert_eq!(out.server_port, 25566);
        assert_eq!(out.protocol_version, 340);
    }

    #[test]
    fn test_rewrite_drops_fml_suffix() {
        let out = rewriter(true).rewrite(&handshake("mc.example.com\0FML\0", NextState::Login));
        assert_eq!(out.server_address, "backend.local");
    }

    #[test]
    fn test_rewrite_plain_host() {
        let out = rewriter(false).rewrite(&handshake("mc.example.com", NextState::Login));
        assert_eq!(out.server_address, "backend.local");
    }

    #[test]
    fn test_marker_must_be_suffix() {
        let out = rewriter(false).rewrite(&handshake("mc\0FML\0.example.com", NextState::Login));
        assert_eq!(out.server_address, "backend.local");
    }

    #[test]
    fn test_disabled_keeps_host_and_port() {
        let rewriter = HostRewriter::new(&profile());
        let original = handshake("mc.example.com\0FML\0", NextState::Transfer);
        let out = rewriter.rewrite(&original);
        assert_eq!(out.server_address, original.server_address);
        assert_eq!(out.server_port, 25565);
        assert_eq!(out.next_state, NextState::Login);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        for ignore in [false, true] {
            let rewriter = rewriter(ignore);
            let once = rewriter.rewrite(&handshake("mc.example.com\0FML\0", NextState::Login));
            let twice = rewriter.rewrite(&once);
            assert_eq!(once, twice);
        }
    }
}
