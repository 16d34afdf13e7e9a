// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module-local entitlements
//!
//! Some grants don't come from the identity provider at all: a module can
//! hand out permissions directly (e.g., a provider being granted upload
//! access to their own documents).  This resolver keeps those grants in a
//! local table.

use super::PermissionResolver;
use super::ResolverError;
use crate::permissions::Permission;
use async_trait::async_trait;
use atrium_common::UserId;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Mutex;

/// Resolves permissions from an in-memory entitlement table
pub struct EntitlementsResolver {
    grants: Mutex<HashMap<UserId, BTreeSet<Permission>>>,
}

impl EntitlementsResolver {
    pub fn new() -> EntitlementsResolver {
        EntitlementsResolver { grants: Mutex::new(HashMap::new()) }
    }

    /// Grants `permissions` to `user_id` (idempotent)
    pub fn grant<I>(&self, user_id: UserId, permissions: I)
    where
        I: IntoIterator<Item = Permission>,
    {
        let mut grants = self.grants.lock().unwrap();
        grants
            .entry(user_id)
            .or_default()
            .extend(permissions.into_iter().filter(|p| *p != Permission::None));
    }

    /// Removes every entitlement for `user_id`
    pub fn revoke_all(&self, user_id: &UserId) {
        self.grants.lock().unwrap().remove(user_id);
    }
}

impl Default for EntitlementsResolver {
    fn default() -> Self {
        EntitlementsResolver::new()
    }
}

#[async_trait]
impl PermissionResolver for EntitlementsResolver {
    fn name(&self) -> &'static str {
        "entitlements"
    }

    fn can_resolve(&self, permission: Permission) -> bool {
        permission != Permission::None
    }

    async fn resolve(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Permission>, ResolverError> {
        let grants = self.grants.lock().unwrap();
        Ok(grants
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}
