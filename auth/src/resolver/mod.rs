// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pluggable permission sources
//!
//! Each resolver is an independent source of truth for some subset of a
//! user's permissions.  The aggregation service fans out to all registered
//! resolvers concurrently and merges whatever they grant; a resolver that
//! fails only shrinks the effective permission set, never grows it.

pub mod entitlements;
pub mod role_mapping;

use crate::permissions::Permission;
use async_trait::async_trait;
use atrium_common::UserId;

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The resolver's backing source could not be reached or answered with
    /// an error.  The aggregation service logs this and continues with the
    /// other resolvers.
    #[error("permission source unavailable: {source:#}")]
    Unavailable {
        #[source]
        source: anyhow::Error,
    },

    /// The call was cancelled (e.g., host shutdown).  Distinct from a
    /// failure: it is not counted against the resolver and callers should
    /// not retry within the same request.
    #[error("permission resolution cancelled")]
    Cancelled,
}

/// A source of permissions for a given user
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Stable label for this resolver, used in logs and the health probe
    fn name(&self) -> &'static str;

    /// Cheap, synchronous hint: could this source ever grant `permission`?
    ///
    /// Used only for optional short-circuiting, never for correctness.
    fn can_resolve(&self, permission: Permission) -> bool;

    /// Resolves every permission this source grants to `user_id`
    ///
    /// "This source grants nothing to this user" is `Ok(vec![])`, not an
    /// error.  Errors are reserved for genuine I/O failures.
    async fn resolve(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Permission>, ResolverError>;
}
