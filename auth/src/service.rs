// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission aggregation service
//!
//! Fans out to every registered resolver, merges and dedupes the results,
//! and owns the read-through cache in front of them.
//!
//! Every operation here is deliberately infallible: a failing resolver is
//! logged and excluded (the others still contribute), and a failing cache is
//! treated as a miss.  Each failure mode can only shrink the effective
//! permission set — silently granting extra permissions would be the unsafe
//! direction, and this design never does that.
//!
//! Concurrency: resolver fan-out for a single user runs concurrently, so a
//! computation is bounded by the slowest resolver rather than the sum.  An
//! invalidation racing an in-flight recomputation is accepted behavior
//! (eventually consistent): the recompute may repopulate slightly-stale
//! data, corrected on TTL expiry or the next explicit invalidation.

use crate::cache;
use crate::cache::PermissionCache;
use crate::permissions::Permission;
use crate::resolver::PermissionResolver;
use crate::resolver::ResolverError;
use crate::stats::PermissionStats;
use crate::stats::StatsSnapshot;
use atrium_common::UserId;
use futures::future;
use slog::debug;
use slog::warn;
use slog::Logger;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

pub struct PermissionService {
    log: Logger,
    resolvers: Vec<Arc<dyn PermissionResolver>>,
    cache: Arc<dyn PermissionCache>,
    cache_ttl: Duration,
    stats: Arc<PermissionStats>,
}

impl PermissionService {
    pub fn new(
        log: Logger,
        cache: Arc<dyn PermissionCache>,
        cache_ttl: Duration,
    ) -> PermissionService {
        PermissionService {
            log,
            resolvers: Vec::new(),
            cache,
            cache_ttl,
            stats: Arc::new(PermissionStats::default()),
        }
    }

    /// Registers a resolver (explicit list; order is not significant)
    pub fn with_resolver(
        mut self,
        resolver: Arc<dyn PermissionResolver>,
    ) -> PermissionService {
        self.resolvers.push(resolver);
        self
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the complete, deduplicated permission set for `user_id`
    ///
    /// Read-through: a cache hit returns the stored snapshot; a miss (or a
    /// cache failure, which is treated as a miss) triggers a concurrent
    /// fan-out over all registered resolvers, and the merged result is
    /// written back with a TTL and the user's invalidation tag.  Order of
    /// the returned list is not significant.
    pub async fn get_user_permissions(
        &self,
        user_id: &UserId,
    ) -> Vec<Permission> {
        let _active = self.stats.begin_check();
        let key = cache::permissions_key(user_id);

        match self.cache.lookup(&key).await {
            Ok(Some(permissions)) => {
                self.stats.record_cache_hit();
                debug!(self.log, "permission cache hit";
                    "user_id" => %user_id,
                    "count" => permissions.len(),
                );
                return permissions;
            }
            Ok(None) => {
                self.stats.record_cache_miss();
            }
            Err(error) => {
                // The cache is an optimization, not a correctness
                // dependency: fall back to direct resolver aggregation.
                self.stats.record_cache_miss();
                warn!(self.log, "permission cache lookup failed";
                    "user_id" => %user_id,
                    "error" => %error,
                );
            }
        }

        let permissions = self.resolve_all(user_id).await;

        let tags = vec![cache::user_tag(user_id)];
        if let Err(error) = self
            .cache
            .insert(&key, &permissions, self.cache_ttl, &tags)
            .await
        {
            warn!(self.log, "permission cache insert failed";
                "user_id" => %user_id,
                "error" => %error,
            );
        }
        permissions
    }

    /// Concurrent fan-out over all resolvers with per-resolver failure
    /// isolation
    async fn resolve_all(&self, user_id: &UserId) -> Vec<Permission> {
        let calls = self.resolvers.iter().map(|resolver| {
            let resolver = Arc::clone(resolver);
            async move { (resolver.name(), resolver.resolve(user_id).await) }
        });
        let results = future::join_all(calls).await;

        let mut merged = BTreeSet::new();
        for (name, result) in results {
            match result {
                Ok(permissions) => {
                    debug!(self.log, "resolver contributed permissions";
                        "resolver" => name,
                        "user_id" => %user_id,
                        "count" => permissions.len(),
                    );
                    merged.extend(
                        permissions
                            .into_iter()
                            .filter(|p| *p != Permission::None),
                    );
                }
                Err(ResolverError::Cancelled) => {
                    // Not a resolver failure; do not retry within this
                    // request.
                    debug!(self.log, "resolver cancelled";
                        "resolver" => name,
                        "user_id" => %user_id,
                    );
                }
                Err(error) => {
                    warn!(self.log, "resolver failed, continuing without it";
                        "resolver" => name,
                        "user_id" => %user_id,
                        "error" => %error,
                    );
                }
            }
        }
        merged.into_iter().collect()
    }

    /// Does `user_id` hold `permission`?
    pub async fn has_permission(
        &self,
        user_id: &UserId,
        permission: Permission,
    ) -> bool {
        self.stats.record_check();
        self.get_user_permissions(user_id).await.contains(&permission)
    }

    /// Set-membership check over the user's permissions
    ///
    /// An empty `permissions` slice is `true` regardless of `require_all`:
    /// requiring no permission imposes no restriction.
    pub async fn has_permissions(
        &self,
        user_id: &UserId,
        permissions: &[Permission],
        require_all: bool,
    ) -> bool {
        self.stats.record_check();
        if permissions.is_empty() {
            return true;
        }
        let granted: BTreeSet<Permission> =
            self.get_user_permissions(user_id).await.into_iter().collect();
        if require_all {
            permissions.iter().all(|p| granted.contains(p))
        } else {
            permissions.iter().any(|p| granted.contains(p))
        }
    }

    /// The user's permissions filtered to one module (case-insensitive)
    pub async fn get_user_permissions_by_module(
        &self,
        user_id: &UserId,
        module: &str,
    ) -> Vec<Permission> {
        self.get_user_permissions(user_id)
            .await
            .into_iter()
            .filter(|p| p.module().eq_ignore_ascii_case(module))
            .collect()
    }

    /// Evicts the cached permission snapshot for `user_id`
    ///
    /// Used by ops tooling after a role change.  Best-effort: a cache error
    /// is logged, and the stale entry ages out at TTL expiry anyway.
    pub async fn invalidate_user_permissions(&self, user_id: &UserId) {
        let tag = cache::user_tag(user_id);
        match self.cache.invalidate_tag(&tag).await {
            Ok(()) => {
                debug!(self.log, "invalidated cached permissions";
                    "user_id" => %user_id,
                );
            }
            Err(error) => {
                warn!(self.log, "permission cache invalidation failed";
                    "user_id" => %user_id,
                    "error" => %error,
                );
            }
        }
    }
}
