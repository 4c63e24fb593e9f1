//! mcproxy Configuration Management
//!
//! Loads the proxy configuration from a JSON file. Each entry in `services`
//! describes one listener and the backend it fronts; `lists` and `list_files`
//! define the named player lists services can reference.

mod error;
mod favicon;

pub use error::*;
pub use favicon::*;

use mcproxy_access::AccessMode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "mcproxy.json";

/// Complete proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    /// Time a client has to finish the handshake/login exchange
    pub handshake_timeout_secs: u64,

    /// Backend connect timeout
    pub dial_timeout_secs: u64,

    /// SO_LINGER applied before closing a kicked client
    pub linger_secs: u64,

    /// Proxied services
    pub services: Vec<ServiceProfile>,

    /// Inline access lists (list name → player names)
    pub lists: HashMap<String, Vec<String>>,

    /// Access lists stored in files (list name → path)
    pub list_files: HashMap<String, PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            handshake_timeout_secs: 10,
            dial_timeout_secs: 5,
            linger_secs: 10,
            services: Vec::new(),
            lists: HashMap::new(),
            list_files: HashMap::new(),
        }
    }
}

/// Settings for one proxied service
///
/// Read-only once loaded; connection handlers share it behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProfile {
    /// Service name, used in logs and kick messages
    pub name: String,

    /// Address the listener binds to
    pub listen: SocketAddr,

    /// Backend host name or IP
    pub target_address: String,

    /// Backend port
    pub target_port: u16,

    #[serde(default)]
    pub minecraft: MinecraftSettings,
}

/// Protocol-aware settings of a service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MinecraftSettings {
    /// Replace the hostname in the forwarded handshake
    pub enable_hostname_rewrite: bool,

    /// Hostname sent to the backend when rewriting is enabled
    pub rewritten_hostname: String,

    /// Drop the `\0FML\0` marker instead of carrying it over to the rewritten hostname
    pub ignore_fml_suffix: bool,

    /// Description shown in the server list; a non-empty value enables local MOTD answers
    pub motd_description: String,

    /// Favicon, see [`resolve_favicon`] for accepted forms
    pub motd_favicon: String,

    pub online_count: OnlineCount,

    pub name_access: NameAccess,

    pub messages: KickMessages,
}

/// Player count settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineCount {
    /// Maximum players, shown in the MOTD and enforced when `enable_max_limit` is set
    pub max: i64,

    /// Fixed online count for the MOTD; negative means report the live count
    pub online: i64,

    /// Refuse logins once the live count reaches `max`
    pub enable_max_limit: bool,

    /// Lines shown when hovering the player count
    pub sample: Vec<String>,
}

impl Default for OnlineCount {
    fn default() -> Self {
        Self {
            max: 20,
            online: -1,
            enable_max_limit: false,
            sample: Vec::new(),
        }
    }
}

/// Name-based admission settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameAccess {
    pub mode: AccessMode,

    /// List names, checked in order
    pub lists: Vec<String>,
}

/// Kick message templates
///
/// `{player}` and `{service}` are substituted when the message is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KickMessages {
    pub server_full: String,
    pub not_allowed: String,
}

impl Default for KickMessages {
    fn default() -> Self {
        Self {
            server_full: "Sorry {player}, {service} is full. Please try again later.".to_string(),
            not_allowed: "{player}, you are not allowed to join {service}.".to_string(),
        }
    }
}

impl KickMessages {
    /// Substitute placeholders in a template
    pub fn render(template: &str, player: &str, service: &str) -> String {
        template
            .replace("{player}", player)
            .replace("{service}", service)
    }
}

impl ServiceProfile {
    /// `host:port` of the backend, with IPv6 literals bracketed
    pub fn target(&self) -> String {
        if self.target_address.contains(':') && !self.target_address.starts_with('[') {
            format!("[{}]:{}", self.target_address, self.target_port)
        } else {
            format!("{}:{}", self.target_address, self.target_port)
        }
    }

    /// Whether status requests are answered locally instead of being proxied
    pub fn has_motd_override(&self) -> bool {
        !self.minecraft.motd_description.is_empty() || !self.minecraft.motd_favicon.is_empty()
    }

    /// Resolved favicon data URI, if configured
    pub fn favicon(&self) -> Option<&str> {
        let favicon = self.minecraft.motd_favicon.as_str();
        (!favicon.is_empty()).then_some(favicon)
    }

    fn validate(&self, known_lists: &HashSet<&str>) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidService {
            service: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("service name must not be empty".to_string()));
        }
        if self.target_address.trim().is_empty() {
            return Err(invalid("target_address must not be empty".to_string()));
        }
        if self.target_port == 0 {
            return Err(invalid("target_port must be > 0".to_string()));
        }

        let mc = &self.minecraft;
        if mc.enable_hostname_rewrite && mc.rewritten_hostname.is_empty() {
            return Err(invalid(
                "rewritten_hostname must be set when enable_hostname_rewrite is true".to_string(),
            ));
        }
        if mc.online_count.max < 0 {
            return Err(invalid("online_count.max must be >= 0".to_string()));
        }
        if mc.name_access.mode != AccessMode::Default && mc.name_access.lists.is_empty() {
            tracing::warn!(
                "Service {}: name access mode is {} but no lists are configured",
                self.name,
                mc.name_access.mode
            );
        }
        for list in &mc.name_access.lists {
            if !known_lists.contains(list.as_str()) {
                return Err(invalid(format!("references unknown access list '{}'", list)));
            }
        }

        Ok(())
    }
}

impl ProxyConfig {
    /// Load, resolve and validate a configuration file
    ///
    /// Relative paths (list files, favicon files) are resolved against the
    /// directory containing the config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base_dir).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration text
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Self = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        config.resolve_paths(base_dir)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) -> Result<()> {
        for path in self.list_files.values_mut() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
        for service in &mut self.services {
            service.minecraft.motd_favicon = resolve_favicon(&service.minecraft.motd_favicon, base_dir)?;
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Checks
    /// - at least one service, with unique names and listen addresses
    /// - `handshake_timeout_secs` and `dial_timeout_secs` must be > 0
    /// - every list a service references exists
    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(ConfigError::Invalid("no services configured".to_string()));
        }
        if self.handshake_timeout_secs == 0 {
            return Err(ConfigError::Invalid("handshake_timeout_secs must be > 0".to_string()));
        }
        if self.dial_timeout_secs == 0 {
            return Err(ConfigError::Invalid("dial_timeout_secs must be > 0".to_string()));
        }

        let known_lists: HashSet<&str> = self
            .lists
            .keys()
            .chain(self.list_files.keys())
            .map(String::as_str)
            .collect();

        let mut names = HashSet::new();
        let mut listens = HashSet::new();
        for service in &self.services {
            if !names.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate service name '{}'", service.name)));
            }
            if !listens.insert(service.listen) {
                return Err(ConfigError::Invalid(format!(
                    "listen address {} is used by more than one service",
                    service.listen
                )));
            }
            service.validate(&known_lists)?;
        }

        Ok(())
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_secs(self.linger_secs)
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Proxy configuration:");
        tracing::info!("  Handshake timeout: {}s, dial timeout: {}s, linger: {}s",
            self.handshake_timeout_secs, self.dial_timeout_secs, self.linger_secs);
        tracing::info!("  Access lists: {} inline, {} from files", self.lists.len(), self.list_files.len());
        for service in &self.services {
            let mc = &service.minecraft;
            tracing::info!("  [{}] {} -> {}", service.name, service.listen, service.target());
            tracing::info!("    MOTD: {}", if service.has_motd_override() { "local" } else { "proxied" });
            if mc.enable_hostname_rewrite {
                tracing::info!("    Hostname rewrite: {} (ignore FML suffix: {})",
                    mc.rewritten_hostname, mc.ignore_fml_suffix);
            }
            if mc.online_count.enable_max_limit {
                tracing::info!("    Max players: {}", mc.online_count.max);
            }
            if mc.name_access.mode != AccessMode::Default {
                tracing::info!("    Name access: {} {:?}", mc.name_access.mode, mc.name_access.lists);
            }
        }
    }
}
