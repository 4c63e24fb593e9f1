//! Named player lists

use crate::error::{AccessError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A named set of player names
///
/// # Matching
/// Membership is exact and case-sensitive: `Steve` and `steve` are different
/// entries.
///
/// # File Format
/// One name per line. Surrounding whitespace is trimmed, blank lines and lines
/// starting with `#` are skipped:
/// ```text
/// # staff
/// Steve
/// Alex
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    /// List identifier as referenced by services
    name: String,

    /// Player names
    entries: HashSet<String>,
}

impl NameList {
    /// Create a list from an iterator of names
    pub fn new<I, S>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a list from a one-name-per-line text file
    pub fn load_from_file<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = name.into();
        let content = fs::read_to_string(path).map_err(|source| AccessError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let list = Self::parse(name, &content)?;
        debug!("Loaded access list '{}' ({} names) from {:?}", list.name, list.len(), path);
        Ok(list)
    }

    /// Parse list content
    pub fn parse(name: impl Into<String>, content: &str) -> Result<Self> {
        let name = name.into();
        let mut entries = HashSet::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.chars().any(char::is_whitespace) {
                return Err(AccessError::InvalidEntry {
                    list: name,
                    line: idx + 1,
                    reason: format!("player names cannot contain whitespace: {:?}", line),
                });
            }
            entries.insert(line.to_string());
        }

        Ok(Self { name, entries })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, player: &str) -> bool {
        self.entries.contains(player)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
