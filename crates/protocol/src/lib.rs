//! # mcproxy Protocol Library
//!
//! This library implements the slice of the Minecraft Java Edition protocol a
//! reverse proxy needs before it can hand a connection to a raw byte relay:
//! the handshake, the status (server list ping) exchange and the first login
//! packet.
//!
//! ## Architecture
//!
//! ### 1. Codecs Layer ([`codecs`])
//! Field encodings used before compression is negotiated:
//! - VarInt: 1-5 byte LEB128 integer
//! - String: VarInt byte length + UTF-8
//! - Unsigned Short: 2 bytes, big-endian
//! - Byte, Long
//!
//! ### 2. Framing ([`packet`])
//! `{VARINT length}{VARINT id}{payload}` frames. A [`Packet`] remembers the
//! exact bytes it was read from so it can be replayed verbatim.
//!
//! ### 3. Packets ([`packets`], [`status`], [`chat`])
//! Typed handshake, login start, login disconnect and status response packets.
//!
//! ## Usage Example
//!
//! ```rust
//! use mcproxy_protocol::{Handshake, Packet};
//! use mcproxy_core::NextState;
//!
//! let handshake = Handshake {
//!     protocol_version: 763,
//!     server_address: "play.example.com".to_string(),
//!     server_port: 25565,
//!     next_state: NextState::Login,
//! };
//! let packet: Packet = handshake.encode();
//! assert_eq!(Handshake::decode(&packet).unwrap(), handshake);
//! ```
//!
//! ## Robustness
//!
//! Every decoder is a fallible function over an in-memory buffer. Lengths are
//! bounds-checked before allocation and no input can cause a panic; bad input
//! surfaces as [`mcproxy_core::ProxyError::MalformedPacket`].

pub mod codecs;
pub mod packet;
pub mod packets;
pub mod status;
pub mod chat;
pub mod versions;

// Re-export commonly used items
pub use codecs::*;
pub use packet::*;
pub use packets::*;
pub use status::*;
pub use chat::*;
pub use versions::*;
