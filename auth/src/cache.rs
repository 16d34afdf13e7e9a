// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tag-addressable permission cache
//!
//! The aggregation service stores one complete permission snapshot per user
//! under the key `permissions:<user_id>`, tagged `user:<user_id>` so that a
//! role change can evict everything for that user without knowing individual
//! keys.
//!
//! The cache is an optimization, not a correctness dependency: callers treat
//! every [`CacheError`] as a miss (on reads) or log and continue (on writes
//! and invalidation).  Entries are always complete snapshots — a partial
//! merge is never stored.

use crate::permissions::Permission;
use async_trait::async_trait;
use atrium_common::UserId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Cache key for a user's permission snapshot
pub fn permissions_key(user_id: &UserId) -> String {
    format!("permissions:{}", user_id)
}

/// Invalidation tag covering everything cached for a user
pub fn user_tag(user_id: &UserId) -> String {
    format!("user:{}", user_id)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {source:#}")]
    Unavailable {
        #[source]
        source: anyhow::Error,
    },
}

/// A key/value store with per-entry TTL and tag-based bulk removal
///
/// The distributed backend (and its replication/consistency story) is out of
/// scope here; implementations are treated as best-effort black boxes.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    async fn lookup(
        &self,
        key: &str,
    ) -> Result<Option<Vec<Permission>>, CacheError>;

    async fn insert(
        &self,
        key: &str,
        value: &[Permission],
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError>;

    /// Removes every entry carrying `tag`
    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError>;
}

struct CacheEntry {
    value: Vec<Permission>,
    expires_at: Instant,
    tags: Vec<String>,
}

/// In-process implementation of [`PermissionCache`]
///
/// Suitable for single-node deployments and tests.  Expired entries are
/// dropped lazily on lookup.
pub struct InMemoryPermissionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryPermissionCache {
    pub fn new() -> InMemoryPermissionCache {
        InMemoryPermissionCache { entries: Mutex::new(HashMap::new()) }
    }
}

impl Default for InMemoryPermissionCache {
    fn default() -> Self {
        InMemoryPermissionCache::new()
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn lookup(
        &self,
        key: &str,
    ) -> Result<Option<Vec<Permission>>, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn insert(
        &self,
        key: &str,
        value: &[Permission],
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
            tags: tags.to_vec(),
        };
        self.entries.lock().unwrap().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        Ok(())
    }
}
