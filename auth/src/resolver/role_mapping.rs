// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity-provider role mapping
//!
//! Translates realm-role names assigned by the identity provider into
//! permission sets via an explicit, exhaustive table.  There is no wildcard
//! or prefix-based fallback: every role that grants anything appears below,
//! and an unrecognized role resolves to nothing.  No privilege is ever
//! implied by naming convention.

use super::PermissionResolver;
use super::ResolverError;
use crate::idp::IdentityProviderClient;
use crate::permissions::Permission;
use async_trait::async_trait;
use atrium_common::UserId;
use slog::debug;
use slog::Logger;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Permissions granted by a single realm role
///
/// Adding a new role means adding a new arm here, where it can be reviewed.
pub fn permissions_for_role(role: &str) -> &'static [Permission] {
    match role {
        "admin" => &[
            Permission::AdminFullAccess,
            Permission::AdminViewMetrics,
            Permission::UsersRead,
            Permission::UsersCreate,
            Permission::UsersUpdate,
            Permission::UsersDelete,
            Permission::ProvidersRead,
            Permission::ProvidersCreate,
            Permission::ProvidersUpdate,
            Permission::ProvidersDelete,
            Permission::DocumentsRead,
            Permission::DocumentsUpload,
            Permission::DocumentsDelete,
            Permission::CatalogsRead,
            Permission::CatalogsManage,
            Permission::LocationsRead,
            Permission::LocationsManage,
        ],
        "provider" => &[
            Permission::ProvidersRead,
            Permission::ProvidersUpdate,
            Permission::DocumentsRead,
            Permission::DocumentsUpload,
            Permission::CatalogsRead,
            Permission::LocationsRead,
        ],
        "front_desk" => &[
            Permission::UsersRead,
            Permission::ProvidersRead,
            Permission::CatalogsRead,
            Permission::LocationsRead,
        ],
        "auditor" => &[
            Permission::AdminViewMetrics,
            Permission::UsersRead,
            Permission::DocumentsRead,
        ],
        _ => &[],
    }
}

/// Resolves permissions from the identity provider's realm-role assignments
pub struct RoleMappingResolver {
    log: Logger,
    idp: Arc<dyn IdentityProviderClient>,
}

impl RoleMappingResolver {
    pub fn new(
        log: Logger,
        idp: Arc<dyn IdentityProviderClient>,
    ) -> RoleMappingResolver {
        RoleMappingResolver { log, idp }
    }
}

#[async_trait]
impl PermissionResolver for RoleMappingResolver {
    fn name(&self) -> &'static str {
        "role_mapping"
    }

    fn can_resolve(&self, permission: Permission) -> bool {
        // Some role grants every catalog permission, so the only thing this
        // source can never produce is the placeholder.
        permission != Permission::None
    }

    async fn resolve(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Permission>, ResolverError> {
        let roles = self
            .idp
            .realm_roles(user_id)
            .await
            .map_err(|source| ResolverError::Unavailable { source })?;

        let mut granted = BTreeSet::new();
        for role in &roles {
            granted.extend(permissions_for_role(role).iter().copied());
        }
        debug!(self.log, "mapped identity provider roles to permissions";
            "user_id" => %user_id,
            "roles" => roles.len(),
            "permissions" => granted.len(),
        );
        Ok(granted.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;
    use slog::o;

    struct StaticRoles(Vec<String>);

    #[async_trait]
    impl IdentityProviderClient for StaticRoles {
        async fn realm_roles(
            &self,
            _user_id: &UserId,
        ) -> Result<Vec<String>, anyhow::Error> {
            Ok(self.0.clone())
        }
    }

    struct BrokenIdp;

    #[async_trait]
    impl IdentityProviderClient for BrokenIdp {
        async fn realm_roles(
            &self,
            _user_id: &UserId,
        ) -> Result<Vec<String>, anyhow::Error> {
            Err(anyhow!("connection refused"))
        }
    }

    fn test_logger() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    #[test]
    fn test_admin_role_spans_core_modules() {
        let granted: BTreeSet<&str> = permissions_for_role("admin")
            .iter()
            .map(|p| p.module())
            .collect();
        for module in ["admin", "users", "providers", "catalogs", "locations"]
        {
            assert!(granted.contains(module), "admin role missing {}", module);
        }
    }

    #[test]
    fn test_unknown_role_grants_nothing() {
        assert!(permissions_for_role("superuser").is_empty());
        assert!(permissions_for_role("Admin").is_empty());
        assert!(permissions_for_role("").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_merges_and_dedupes_roles() {
        let resolver = RoleMappingResolver::new(
            test_logger(),
            Arc::new(StaticRoles(vec![
                "provider".to_string(),
                "front_desk".to_string(),
                "no_such_role".to_string(),
            ])),
        );
        let granted =
            resolver.resolve(&UserId::new_v4()).await.unwrap();
        // ProvidersRead appears in both roles but only once in the result.
        assert_eq!(
            granted.iter().filter(|p| **p == Permission::ProvidersRead).count(),
            1
        );
        assert!(granted.contains(&Permission::UsersRead));
        assert!(granted.contains(&Permission::DocumentsUpload));
        assert!(!granted.contains(&Permission::AdminFullAccess));
    }

    #[tokio::test]
    async fn test_resolve_with_no_roles_is_empty_not_error() {
        let resolver = RoleMappingResolver::new(
            test_logger(),
            Arc::new(StaticRoles(vec![])),
        );
        assert_eq!(resolver.resolve(&UserId::new_v4()).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_idp_failure_is_contained() {
        let resolver =
            RoleMappingResolver::new(test_logger(), Arc::new(BrokenIdp));
        let error = resolver.resolve(&UserId::new_v4()).await.unwrap_err();
        assert!(matches!(error, ResolverError::Unavailable { .. }));
    }
}
