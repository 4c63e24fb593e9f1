//! JSON chat components
//!
//! Disconnect reasons and MOTD descriptions are sent as chat components. Only
//! the subset the proxy produces is modelled here.

use serde::{Deserialize, Serialize};

/// A text chat component with an optional color
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatComponent {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChatComponent {
    /// Plain, unstyled text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Serialize to the JSON string sent on the wire
    pub fn to_json(&self) -> String {
        // A struct of strings always serializes
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"text\":\"\"}"))
    }
}
