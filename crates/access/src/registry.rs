//! Shared registry of named lists

use crate::error::{AccessError, Result};
use crate::list::NameList;
use crate::ListMembership;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry of access lists keyed by list name
///
/// # Thread Safety
/// Backed by a `DashMap`. Lookups clone the list's `Arc` and never hold a
/// shard lock while the caller inspects it, so a list can be replaced with
/// [`insert`](Self::insert) while connections are being checked against the
/// old version.
#[derive(Debug, Default)]
pub struct AccessRegistry {
    lists: DashMap<String, Arc<NameList>>,
}

impl AccessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from inline lists and list files
    ///
    /// # Errors
    /// Fails on the first list file that cannot be read or parsed. A name
    /// present in both maps resolves to the file.
    pub fn from_sources(
        inline: &HashMap<String, Vec<String>>,
        files: &HashMap<String, PathBuf>,
    ) -> Result<Self> {
        let registry = Self::new();

        for (name, entries) in inline {
            registry.insert(NameList::new(name.clone(), entries.iter().cloned()));
        }
        for (name, path) in files {
            registry.insert(NameList::load_from_file(name.clone(), path)?);
        }

        info!("Access registry ready with {} list(s)", registry.len());
        Ok(registry)
    }

    /// Add or replace a list
    pub fn insert(&self, list: NameList) -> Option<Arc<NameList>> {
        self.lists.insert(list.name().to_string(), Arc::new(list))
    }

    /// Get a list by name
    pub fn get(&self, name: &str) -> Result<Arc<NameList>> {
        self.lists
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AccessError::UnknownList(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl ListMembership for AccessRegistry {
    fn is_member(&self, list: &str, player: &str) -> bool {
        match self.get(list) {
            Ok(names) => names.contains(player),
            Err(e) => {
                warn!("{}; treating '{}' as not listed", e, player);
                false
            }
        }
    }
}
