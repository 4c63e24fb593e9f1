//! # Status Response
//!
//! Clientbound status response (packet 0x00, status state). The payload is a
//! single String holding a JSON document:
//!
//! ```text
//! {"version":{"name":"1.20.1","protocol":763},
//!  "players":{"max":20,"online":3,"sample":[{"name":"Steve","id":"..."}]},
//!  "description":{"text":"A Minecraft Server"},
//!  "favicon":"data:image/png;base64,..."}
//! ```
//!
//! `sample` and `favicon` are omitted when empty.

use crate::codecs::write_string;
use crate::packet::Packet;
use bytes::BytesMut;
use mcproxy_core::{ProxyError, Result};
use serde::{Deserialize, Serialize};

/// Placeholder UUID used for sample entries that are not real players
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: StatusVersion,
    pub players: StatusPlayers,
    pub description: StatusDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: i64,
    pub online: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample: Vec<PlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

impl PlayerSample {
    /// A hover-text line that does not belong to a real player
    pub fn line(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: NIL_UUID.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDescription {
    pub text: String,
}

impl StatusResponse {
    pub const PACKET_ID: i32 = 0x00;

    /// Serialize to the JSON document carried in the packet
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ProxyError::Encode(format!("status response: {}", e)))
    }

    /// Encode as a status response packet
    pub fn encode(&self) -> Result<Packet> {
        let json = self.to_json()?;
        let mut buf = BytesMut::with_capacity(json.len() + 3);
        write_string(&mut buf, &json);
        Ok(Packet::new(Self::PACKET_ID, buf.freeze()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{read_string, MAX_STRING_LEN};

    fn response(favicon: Option<String>) -> StatusResponse {
        StatusResponse {
            version: StatusVersion {
                name: "1.20.1".into(),
                protocol: 763,
            },
            players: StatusPlayers {
                max: 20,
                online: 3,
                sample: Vec::new(),
            },
            description: StatusDescription {
                text: "Hello\nWorld".into(),
            },
            favicon,
        }
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = response(None).to_json().unwrap();
        assert!(!json.contains("favicon"));
        assert!(!json.contains("sample"));
    }

    #[test]
    fn test_encode_packet() {
        let favicon = "data:image/png;base64,AAAA".to_string();
        let packet = response(Some(favicon.clone())).encode().unwrap();
        assert_eq!(packet.id(), 0x00);

        let mut payload = packet.payload();
        let json = read_string(&mut payload, MAX_STRING_LEN * 4).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"]["protocol"], 763);
        assert_eq!(value["players"]["online"], 3);
        assert_eq!(value["description"]["text"], "Hello\nWorld");
        assert_eq!(value["favicon"], favicon.as_str());
    }
}
