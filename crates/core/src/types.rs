//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection ID (64-bit unsigned, unique per process)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Protocol state requested by the client in its handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextState {
    /// Server list ping
    Status = 1,
    /// Regular login
    Login = 2,
    /// Login following a server transfer (1.20.5+)
    Transfer = 3,
}

impl NextState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Status),
            2 => Some(Self::Login),
            3 => Some(Self::Transfer),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Both plain logins and transfers go through the login gate
    pub fn is_login(&self) -> bool {
        matches!(self, Self::Login | Self::Transfer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Login => "login",
            Self::Transfer => "transfer",
        }
    }
}
