// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization decisions
//!
//! [`authorize`] is the per-protected-operation check: one required
//! permission against the claims already materialized on the principal by
//! [`crate::authn::ClaimsEnricher`].  It is synchronous, performs no I/O,
//! and never calls the aggregation service — that separation keeps the hot
//! path O(1) and allocation-light.
//!
//! A denied end user sees only the generic [`Error::Forbidden`]; the
//! diagnostic detail (subject, permission) goes to the structured log.

use crate::authn;
use crate::authn::Principal;
use crate::permissions::Permission;
use atrium_common::Error;
use slog::debug;
use slog::warn;
use slog::Logger;

/// A single permission that a protected operation demands
///
/// Construction rejects the [`Permission::None`] placeholder; a requirement
/// always names a concrete permission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PermissionRequirement {
    permission: Permission,
}

impl PermissionRequirement {
    pub fn new(permission: Permission) -> Result<PermissionRequirement, Error> {
        if permission == Permission::None {
            return Err(Error::invalid_value(
                "permission",
                "a permission requirement must name a concrete permission",
            ));
        }
        Ok(PermissionRequirement { permission })
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// The canonical string compared against the principal's permission
    /// claims
    pub fn permission_name(&self) -> &'static str {
        self.permission.name()
    }
}

/// Decides whether `principal` satisfies `requirement`
///
/// A missing or unauthenticated principal is an explicit
/// [`Error::Unauthenticated`] (not merely "not succeeded"), so the caller
/// short-circuits rather than falling through to other handlers.
pub fn authorize(
    log: &Logger,
    requirement: &PermissionRequirement,
    principal: Option<&Principal>,
) -> Result<(), Error> {
    let principal = match principal {
        Some(principal) if principal.is_authenticated() => principal,
        _ => {
            debug!(log, "authorization denied: unauthenticated";
                "permission" => requirement.permission_name(),
            );
            return Err(Error::Unauthenticated {
                internal_message: format!(
                    "permission {} requires an authenticated principal",
                    requirement.permission_name(),
                ),
            });
        }
    };

    // The subject is extracted only for the log line; the decision itself
    // is a claim-membership test.
    let subject = match principal.subject() {
        Some(subject) => subject,
        None => {
            warn!(log, "authorization denied: principal has no subject claim";
                "permission" => requirement.permission_name(),
            );
            return Err(Error::Forbidden);
        }
    };

    if principal
        .has_claim(authn::PERMISSION_CLAIM, requirement.permission_name())
    {
        debug!(log, "authorization granted";
            "subject" => %subject,
            "permission" => requirement.permission_name(),
        );
        Ok(())
    } else {
        debug!(log, "authorization denied: permission claim missing";
            "subject" => %subject,
            "permission" => requirement.permission_name(),
        );
        Err(Error::Forbidden)
    }
}
