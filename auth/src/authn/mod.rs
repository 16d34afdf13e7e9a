// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Principals and claims enrichment
//!
//! The host's authentication middleware hands us a [`Principal`]: a bag of
//! `(type, value)` claims plus an authenticated bit.  [`ClaimsEnricher`]
//! runs exactly once per authentication event and materializes the user's
//! resolved permissions as additional claims, so that the authorization
//! decision ([`crate::authz`]) never has to touch the aggregation service.
//!
//! Enrichment is a pure data transform: it builds a new `Principal` rather
//! than mutating the input.  Every failure mode degrades to "principal
//! unchanged" — authentication is never blocked by an enrichment failure.

use crate::service::PermissionService;
use atrium_common::UserId;
use slog::debug;
use slog::warn;
use slog::Logger;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Claim type carrying one canonical permission string
pub const PERMISSION_CLAIM: &str = "permission";
/// Claim type carrying one module name represented in the permission set
pub const MODULE_CLAIM: &str = "module";
/// Claim type set to `"true"` when the principal holds any `admin` module
/// permission
pub const SYSTEM_ADMIN_CLAIM: &str = "system_admin";
/// Marker value: a `permission` claim with this literal value records that
/// enrichment already ran for this principal
pub const PERMISSIONS_LOADED_MARKER: &str = "*";

/// Subject claim types, in extraction priority order
pub const CLAIM_NAME_IDENTIFIER: &str = "name_identifier";
pub const CLAIM_SUB: &str = "sub";
pub const CLAIM_ID: &str = "id";

/// One `(type, value)` pair on a principal
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Claim {
    claim_type: String,
    value: String,
}

impl Claim {
    pub fn new<T, V>(claim_type: T, value: V) -> Claim
    where
        T: Into<String>,
        V: Into<String>,
    {
        Claim { claim_type: claim_type.into(), value: value.into() }
    }

    pub fn claim_type(&self) -> &str {
        &self.claim_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A claims-bearing principal, as supplied by the host's authentication
/// middleware
#[derive(Clone, Debug)]
pub struct Principal {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// An unauthenticated principal with no claims
    pub fn anonymous() -> Principal {
        Principal { authenticated: false, claims: Vec::new() }
    }

    /// An authenticated principal carrying `claims`
    pub fn authenticated(claims: Vec<Claim>) -> Principal {
        Principal { authenticated: true, claims }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.claim_type == claim_type && c.value == value)
    }

    pub fn first_claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// The principal's subject identifier, if any
    ///
    /// Checked in priority order: the primary name-identifier claim, then
    /// `sub`, then `id`.
    pub fn subject(&self) -> Option<&str> {
        [CLAIM_NAME_IDENTIFIER, CLAIM_SUB, CLAIM_ID]
            .iter()
            .find_map(|claim_type| self.first_claim(claim_type))
    }
}

/// Materializes resolved permissions as claims, once per principal
pub struct ClaimsEnricher {
    log: Logger,
    service: Arc<PermissionService>,
}

impl ClaimsEnricher {
    pub fn new(log: Logger, service: Arc<PermissionService>) -> ClaimsEnricher {
        ClaimsEnricher { log, service }
    }

    /// Returns `principal` enriched with permission claims, or unchanged if
    /// enrichment does not apply (see module docs for the failure posture)
    pub async fn enrich(&self, principal: Principal) -> Principal {
        if !principal.is_authenticated() {
            return principal;
        }

        // One-shot guard: middleware chains can run an enrichment step more
        // than once over the same materialized principal.
        if principal.has_claim(PERMISSION_CLAIM, PERMISSIONS_LOADED_MARKER) {
            debug!(self.log, "principal already enriched; skipping");
            return principal;
        }

        let subject = match principal.subject() {
            Some(subject) => subject.to_owned(),
            None => {
                // Fail open to "no extra claims": the caller's
                // authentication still holds, but no permissions are
                // granted.
                warn!(
                    self.log,
                    "authenticated principal has no subject claim; \
                     skipping permission enrichment"
                );
                return principal;
            }
        };

        let user_id = match subject.parse::<UserId>() {
            Ok(user_id) => user_id,
            Err(error) => {
                warn!(self.log, "subject claim is not a valid user id";
                    "subject" => %subject,
                    "error" => %error,
                );
                return principal;
            }
        };

        let permissions = self.service.get_user_permissions(&user_id).await;
        if permissions.is_empty() {
            // No marker claim here: the step may retry on a later call if
            // permissions become available.
            debug!(self.log, "no permissions resolved for principal";
                "user_id" => %user_id,
            );
            return principal;
        }

        let mut claims = principal.claims().to_vec();
        let mut modules = BTreeSet::new();
        for permission in &permissions {
            claims.push(Claim::new(PERMISSION_CLAIM, permission.name()));
            modules.insert(permission.module());
        }
        for module in &modules {
            claims.push(Claim::new(MODULE_CLAIM, *module));
        }
        claims.push(Claim::new(PERMISSION_CLAIM, PERMISSIONS_LOADED_MARKER));
        if modules.contains("admin") {
            claims.push(Claim::new(SYSTEM_ADMIN_CLAIM, "true"));
        }

        debug!(self.log, "enriched principal with permission claims";
            "user_id" => %user_id,
            "permissions" => permissions.len(),
            "modules" => modules.len(),
        );
        Principal::authenticated(claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::InMemoryPermissionCache;
    use crate::permissions::Permission;
    use crate::resolver::entitlements::EntitlementsResolver;
    use slog::o;
    use std::time::Duration;

    fn test_logger() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    fn enricher_for(
        user_id: UserId,
        permissions: Vec<Permission>,
    ) -> ClaimsEnricher {
        let entitlements = Arc::new(EntitlementsResolver::new());
        entitlements.grant(user_id, permissions);
        let service = Arc::new(
            PermissionService::new(
                test_logger(),
                Arc::new(InMemoryPermissionCache::new()),
                Duration::from_secs(300),
            )
            .with_resolver(entitlements),
        );
        ClaimsEnricher::new(test_logger(), service)
    }

    fn subject_principal(user_id: &UserId) -> Principal {
        Principal::authenticated(vec![Claim::new(
            CLAIM_SUB,
            user_id.to_string(),
        )])
    }

    fn permission_claims(principal: &Principal) -> Vec<&str> {
        principal
            .claims()
            .iter()
            .filter(|c| c.claim_type() == PERMISSION_CLAIM)
            .map(|c| c.value())
            .collect()
    }

    #[tokio::test]
    async fn test_enrichment_materializes_claims() {
        let user = UserId::new_v4();
        let enricher = enricher_for(
            user,
            vec![Permission::UsersRead, Permission::CatalogsRead],
        );
        let enriched = enricher.enrich(subject_principal(&user)).await;

        assert_eq!(
            permission_claims(&enriched),
            vec!["users:read", "catalogs:read", "*"]
        );
        assert!(enriched.has_claim(MODULE_CLAIM, "users"));
        assert!(enriched.has_claim(MODULE_CLAIM, "catalogs"));
        // No admin-module permission, so no system_admin claim.
        assert!(enriched.first_claim(SYSTEM_ADMIN_CLAIM).is_none());
        // The original subject claim is preserved.
        assert_eq!(enriched.subject().unwrap(), user.to_string());
    }

    #[tokio::test]
    async fn test_admin_module_sets_system_admin() {
        let user = UserId::new_v4();
        let enricher =
            enricher_for(user, vec![Permission::AdminViewMetrics]);
        let enriched = enricher.enrich(subject_principal(&user)).await;
        assert!(enriched.has_claim(SYSTEM_ADMIN_CLAIM, "true"));
    }

    #[tokio::test]
    async fn test_enrichment_is_idempotent() {
        let user = UserId::new_v4();
        let enricher = enricher_for(user, vec![Permission::UsersRead]);
        let once = enricher.enrich(subject_principal(&user)).await;
        let twice = enricher.enrich(once.clone()).await;

        assert_eq!(once.claims(), twice.claims());
        // The second pass stopped at the marker claim and never called the
        // service: the only cache lookup on record is the first pass's miss
        // (a second call would have been a hit, moving the rate to 0.5).
        assert_eq!(enricher.service.stats_snapshot().cache_hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_unauthenticated_principal_unchanged() {
        let user = UserId::new_v4();
        let enricher = enricher_for(user, vec![Permission::UsersRead]);
        let principal = Principal::anonymous();
        let result = enricher.enrich(principal).await;
        assert!(!result.is_authenticated());
        assert!(result.claims().is_empty());
    }

    #[tokio::test]
    async fn test_missing_subject_claim_fails_open() {
        let user = UserId::new_v4();
        let enricher = enricher_for(user, vec![Permission::UsersRead]);
        let principal = Principal::authenticated(vec![Claim::new(
            "email",
            "nurse@example.com",
        )]);
        let result = enricher.enrich(principal.clone()).await;
        assert_eq!(result.claims(), principal.claims());
    }

    #[tokio::test]
    async fn test_malformed_subject_fails_open() {
        let user = UserId::new_v4();
        let enricher = enricher_for(user, vec![Permission::UsersRead]);
        let principal = Principal::authenticated(vec![Claim::new(
            CLAIM_SUB,
            "not-a-uuid",
        )]);
        let result = enricher.enrich(principal.clone()).await;
        assert_eq!(result.claims(), principal.claims());
    }

    #[tokio::test]
    async fn test_empty_permission_set_adds_no_marker() {
        let user = UserId::new_v4();
        let enricher = enricher_for(user, vec![]);
        let principal = subject_principal(&user);
        let result = enricher.enrich(principal.clone()).await;
        assert_eq!(result.claims(), principal.claims());
        assert!(
            !result.has_claim(PERMISSION_CLAIM, PERMISSIONS_LOADED_MARKER)
        );
    }

    #[tokio::test]
    async fn test_subject_priority_order() {
        let primary = UserId::new_v4();
        let secondary = UserId::new_v4();
        let principal = Principal::authenticated(vec![
            Claim::new(CLAIM_ID, secondary.to_string()),
            Claim::new(CLAIM_NAME_IDENTIFIER, primary.to_string()),
            Claim::new(CLAIM_SUB, secondary.to_string()),
        ]);
        assert_eq!(principal.subject().unwrap(), primary.to_string());

        // The name-identifier claim wins: only `primary` was granted
        // anything, and enrichment found it.
        let enricher = enricher_for(primary, vec![Permission::UsersRead]);
        let enriched = enricher.enrich(principal).await;
        assert!(enriched.has_claim(PERMISSION_CLAIM, "users:read"));
    }
}
