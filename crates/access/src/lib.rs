//! # mcproxy Access Lists
//!
//! Named player lists used to gate logins, and the membership capability the
//! login gate queries.
//!
//! - [`NameList`] - a set of exact, case-sensitive player names
//! - [`AccessRegistry`] - lists keyed by name, loaded from config or files
//! - [`ListMembership`] - the query interface consumed by the gate
//! - [`AccessMode`] - how a service interprets its lists

mod error;
mod list;
mod registry;

pub use error::*;
pub use list::*;
pub use registry::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Set-membership query against named access lists
pub trait ListMembership: Send + Sync {
    /// Whether `player` is in the list called `list`
    ///
    /// An unknown list contains nobody.
    fn is_member(&self, list: &str, player: &str) -> bool;
}

impl<T: ListMembership + ?Sized> ListMembership for std::sync::Arc<T> {
    fn is_member(&self, list: &str, player: &str) -> bool {
        (**self).is_member(list, player)
    }
}

/// How a service interprets its configured lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Lists are ignored, everyone may join
    #[default]
    Default,
    /// Only listed players may join
    Allow,
    /// Listed players may not join
    Block,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::Allow => "allow",
            Self::Block => "block",
        };
        f.write_str(s)
    }
}
