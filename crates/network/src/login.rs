//! # Login Gate
//!
//! Admission checks run on the login start packet, before any backend
//! connection exists:
//!
//! 1. **Capacity** - refuse when the live session count reached the
//!    configured maximum (only if `enable_max_limit` is set)
//! 2. **Name lists** - walk the service's lists in order, stop at the first
//!    list containing the player, and resolve the decision from the mode:
//!
//! | mode  | matched | decision |
//! |-------|---------|----------|
//! | Allow | yes     | ALLOW    |
//! | Allow | no      | DENY     |
//! | Block | yes     | REJECT   |
//! | Block | no      | PASS     |
//!
//! Refused players get a login disconnect packet and the socket is closed
//! with a bounded linger.

use crate::counter::ActiveCount;
use crate::outcome::RejectReason;
use crate::stream::ClientStream;
use mcproxy_access::{AccessMode, ListMembership};
use mcproxy_config::{KickMessages, ServiceProfile};
use mcproxy_core::Result;
use mcproxy_protocol::{ChatComponent, LoginDisconnect};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Outcome of the name-list check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Mode is `default`, lists were not consulted
    Default,
    /// Allow mode, player listed
    Allow,
    /// Allow mode, player not listed
    Deny,
    /// Block mode, player listed
    Reject,
    /// Block mode, player not listed
    Pass,
}

impl AccessDecision {
    /// Combine a service's mode with the list match result
    pub fn resolve(mode: AccessMode, matched: bool) -> Self {
        match (mode, matched) {
            (AccessMode::Default, _) => Self::Default,
            (AccessMode::Allow, true) => Self::Allow,
            (AccessMode::Allow, false) => Self::Deny,
            (AccessMode::Block, true) => Self::Reject,
            (AccessMode::Block, false) => Self::Pass,
        }
    }

    /// Whether the player may proceed
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Default | Self::Allow | Self::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
            Self::Reject => "REJECT",
            Self::Pass => "PASS",
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running all admission checks
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Player may join; carries the name-list decision for logging
    Admit(AccessDecision),

    /// Player must be disconnected with `message`
    Kick {
        reason: RejectReason,
        message: ChatComponent,
    },
}

/// Capacity and name-list checks for one service
pub struct LoginGate {
    service: Arc<ServiceProfile>,
    lists: Arc<dyn ListMembership>,
    online: Arc<dyn ActiveCount>,
}

impl LoginGate {
    pub fn new(
        service: Arc<ServiceProfile>,
        lists: Arc<dyn ListMembership>,
        online: Arc<dyn ActiveCount>,
    ) -> Self {
        Self {
            service,
            lists,
            online,
        }
    }

    /// Capacity check
    ///
    /// True when limiting is enabled and the live count is at or above the
    /// configured maximum.
    pub fn is_full(&self) -> bool {
        let count = &self.service.minecraft.online_count;
        if !count.enable_max_limit {
            return false;
        }
        let max = usize::try_from(count.max).unwrap_or(0);
        self.online.active() >= max
    }

    /// Name-list check
    ///
    /// Lists are consulted in configured order and the scan stops at the
    /// first list that contains `player`.
    pub fn check_name(&self, player: &str) -> AccessDecision {
        let access = &self.service.minecraft.name_access;
        if access.mode == AccessMode::Default {
            return AccessDecision::Default;
        }

        let matched = access
            .lists
            .iter()
            .any(|list| self.lists.is_member(list, player));
        AccessDecision::resolve(access.mode, matched)
    }

    /// Run the capacity check, then the name-list check
    pub fn admit(&self, player: &str) -> Admission {
        if self.is_full() {
            return Admission::Kick {
                reason: RejectReason::ServerFull,
                message: self.message(&self.service.minecraft.messages.server_full, player),
            };
        }

        let decision = self.check_name(player);
        if decision.is_admitted() {
            Admission::Admit(decision)
        } else {
            Admission::Kick {
                reason: RejectReason::NameAccess(decision),
                message: self.message(&self.service.minecraft.messages.not_allowed, player),
            }
        }
    }

    fn message(&self, template: &str, player: &str) -> ChatComponent {
        let text = KickMessages::render(template, player, &self.service.name);
        ChatComponent::text(text).color("red")
    }
}

/// Send a login disconnect and close the client
///
/// The client is closed with a lingering close, so the OS keeps trying to
/// deliver the disconnect packet for a bounded time after the proxy let go
/// of the socket. The client stream is consumed.
pub async fn kick<C: ClientStream>(
    mut client: C,
    message: ChatComponent,
    linger: Option<Duration>,
) -> Result<()> {
    LoginDisconnect::new(message).encode().write_to(&mut client).await?;
    client.flush().await?;

    // The peer may already be gone; the disconnect has been written either way
    let _ = client.shutdown().await;
    client.close_lingering(linger);
    Ok(())
}
