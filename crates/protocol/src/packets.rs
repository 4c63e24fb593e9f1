//! # Handshake and Login Packets
//!
//! Typed views over the few packets the proxy needs to understand before it
//! hands a connection to the byte relay. Every packet in this flow uses
//! packet ID `0x00` in its respective protocol state.
//!
//! | Packet         | Direction | State     | Fields                                          |
//! |----------------|-----------|-----------|-------------------------------------------------|
//! | Handshake      | C → S     | handshake | VarInt protocol, String host, UShort port, Byte next state |
//! | Status Request | C → S     | status    | (empty)                                         |
//! | Ping           | C → S     | status    | Long payload (id `0x01`)                         |
//! | Login Start    | C → S     | login     | String name, version-specific trailer           |
//! | Disconnect     | S → C     | login     | String JSON chat component                      |

use crate::chat::ChatComponent;
use crate::codecs::*;
use crate::packet::Packet;
use bytes::BytesMut;
use mcproxy_core::{NextState, ProxyError, Result};

/// Maximum hostname length accepted in a handshake
pub const MAX_HOSTNAME_LEN: usize = 255;

/// Status request frame, always the same two bytes
pub const STATUS_REQUEST_FRAME: [u8; 2] = [0x01, 0x00];

/// Serverbound handshake (packet 0x00, handshake state)
///
/// # Packet Format
/// ```text
/// {VARINT protocol_version}{STRING server_address}{USHORT server_port}{BYTE next_state}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Protocol version advertised by the client
    pub protocol_version: i32,

    /// Hostname the client typed in, possibly carrying a mod-loader suffix
    pub server_address: String,

    /// Port the client connected to
    pub server_port: u16,

    /// State the client wants to enter next
    pub next_state: NextState,
}

impl Handshake {
    pub const PACKET_ID: i32 = 0x00;

    /// Decode a handshake from a freshly read packet
    ///
    /// # Errors
    /// Returns `MalformedPacket` if the packet ID is not `0x00`, a field is
    /// truncated or invalid, or `next_state` is not a known state. Trailing
    /// bytes after `next_state` are ignored.
    pub fn decode(packet: &Packet) -> Result<Self> {
        packet.expect_id(Self::PACKET_ID, "handshake")?;

        let mut buf = packet.payload();
        let protocol_version = read_varint(&mut buf)?;
        let server_address = read_string(&mut buf, MAX_HOSTNAME_LEN)?;
        let server_port = read_ushort(&mut buf)?;
        let raw_state = read_byte(&mut buf)?;
        let next_state = NextState::from_u8(raw_state).ok_or_else(|| {
            ProxyError::malformed(format!("Unknown next state in handshake: {}", raw_state))
        })?;

        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }

    /// Encode into a packet with a minimal length prefix
    pub fn encode(&self) -> Packet {
        let mut buf = BytesMut::with_capacity(self.server_address.len() + 16);
        write_varint(&mut buf, self.protocol_version);
        write_string(&mut buf, &self.server_address);
        write_ushort(&mut buf, self.server_port);
        write_byte(&mut buf, self.next_state.as_u8());
        Packet::new(Self::PACKET_ID, buf.freeze())
    }
}

/// Serverbound login start (packet 0x00, login state)
///
/// # Packet Format
/// ```text
/// {STRING player_name}{...version-specific trailer}
/// ```
///
/// Only the player name is decoded. Newer protocol versions append a UUID
/// and, for some versions, signature data; the proxy never re-encodes this
/// packet, it forwards the original frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub player_name: String,
}

impl LoginStart {
    pub const PACKET_ID: i32 = 0x00;

    pub fn decode(packet: &Packet) -> Result<Self> {
        packet.expect_id(Self::PACKET_ID, "login start")?;

        let mut buf = packet.payload();
        let player_name = read_string(&mut buf, MAX_STRING_LEN)?;
        Ok(Self { player_name })
    }

    pub fn encode(&self) -> Packet {
        let mut buf = BytesMut::new();
        write_string(&mut buf, &self.player_name);
        Packet::new(Self::PACKET_ID, buf.freeze())
    }
}

/// Clientbound disconnect during login (packet 0x00, login state)
///
/// # Packet Format
/// ```text
/// {STRING reason_json}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LoginDisconnect {
    pub reason: ChatComponent,
}

impl LoginDisconnect {
    pub const PACKET_ID: i32 = 0x00;

    pub fn new(reason: ChatComponent) -> Self {
        Self { reason }
    }

    pub fn encode(&self) -> Packet {
        let mut buf = BytesMut::new();
        write_string(&mut buf, &self.reason.to_json());
        Packet::new(Self::PACKET_ID, buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, Bytes};

    fn handshake_payload(protocol: i32, host: &str, port: u16, state: u8) -> Bytes {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, protocol);
        write_string(&mut buf, host);
        write_ushort(&mut buf, port);
        write_byte(&mut buf, state);
        buf.freeze()
    }

    #[test]
    fn test_decode_handshake() {
        let packet = Packet::new(0x00, handshake_payload(763, "play.example.com", 25565, 2));
        let handshake = Handshake::decode(&packet).unwrap();

        assert_eq!(handshake.protocol_version, 763);
        assert_eq!(handshake.server_address, "play.example.com");
        assert_eq!(handshake.server_port, 25565);
        assert_eq!(handshake.next_state, NextState::Login);
    }

    #[test]
    fn test_encode_matches_decoded_frame() {
        let packet = Packet::new(0x00, handshake_payload(47, "example.com\0FML\0", 25565, 1));
        let handshake = Handshake::decode(&packet).unwrap();
        assert_eq!(handshake.encode().frame(), packet.frame());
    }

    #[test]
    fn test_handshake_wrong_packet_id() {
        let packet = Packet::new(0x01, handshake_payload(763, "a", 1, 1));
        assert!(Handshake::decode(&packet).unwrap_err().is_malformed());
    }

    #[test]
    fn test_handshake_unknown_next_state() {
        let packet = Packet::new(0x00, handshake_payload(763, "a", 1, 7));
        assert!(Handshake::decode(&packet).unwrap_err().is_malformed());
    }

    #[test]
    fn test_handshake_truncated() {
        let mut payload = BytesMut::new();
        write_varint(&mut payload, 763);
        write_string(&mut payload, "example.com");
        payload.put_u8(0x63);
        let packet = Packet::new(0x00, payload.freeze());
        assert!(Handshake::decode(&packet).unwrap_err().is_malformed());
    }

    #[test]
    fn test_handshake_hostname_too_long() {
        let host = "a".repeat(MAX_HOSTNAME_LEN + 1);
        let packet = Packet::new(0x00, handshake_payload(763, &host, 25565, 2));
        assert!(Handshake::decode(&packet).is_err());
    }

    #[test]
    fn test_login_start_ignores_trailer() {
        let mut payload = BytesMut::new();
        write_string(&mut payload, "Notch");
        payload.put_slice(&[0xab; 16]);
        let packet = Packet::new(0x00, payload.freeze());

        let login = LoginStart::decode(&packet).unwrap();
        assert_eq!(login.player_name, "Notch");
    }

    #[test]
    fn test_status_request_frame() {
        assert_eq!(Packet::new(0x00, Bytes::new()).frame(), &STATUS_REQUEST_FRAME);
    }

    #[test]
    fn test_disconnect_payload_is_json_string() {
        let packet = LoginDisconnect::new(ChatComponent::text("bye")).encode();
        let mut payload = packet.payload();
        let json = read_string(&mut payload, MAX_STRING_LEN).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["text"], "bye");
    }
}
