// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The permission catalog
//!
//! Permissions form a closed taxonomy: each one is a `module:action` pair,
//! and the full set is known at compile time.  Everything in this module is a
//! pure function over that taxonomy — no I/O, no allocation beyond the
//! returned collections.

use std::collections::BTreeSet;
use strum::IntoEnumIterator;

/// An atomic, named capability of the form `module:action`
///
/// The canonical string form (via [`Permission::name`] / `Display`) is what
/// gets stored in cache entries' wire form, principal claims, and logs.  It
/// is stable and unique per variant, and round-trips through
/// [`Permission::parse`].
///
/// [`Permission::None`] is a distinguished placeholder.  It is excluded from
/// catalog listings and is never a valid input when constructing a
/// [`crate::authz::PermissionRequirement`].
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    strum::EnumIter,
)]
pub enum Permission {
    None,

    // users
    UsersRead,
    UsersCreate,
    UsersUpdate,
    UsersDelete,

    // providers
    ProvidersRead,
    ProvidersCreate,
    ProvidersUpdate,
    ProvidersDelete,

    // documents
    DocumentsRead,
    DocumentsUpload,
    DocumentsDelete,

    // catalogs
    CatalogsRead,
    CatalogsManage,

    // locations
    LocationsRead,
    LocationsManage,

    // admin
    AdminFullAccess,
    AdminViewMetrics,
}

impl Permission {
    /// Returns the canonical `module:action` encoding of this permission
    pub fn name(&self) -> &'static str {
        match self {
            Permission::None => "none:none",
            Permission::UsersRead => "users:read",
            Permission::UsersCreate => "users:create",
            Permission::UsersUpdate => "users:update",
            Permission::UsersDelete => "users:delete",
            Permission::ProvidersRead => "providers:read",
            Permission::ProvidersCreate => "providers:create",
            Permission::ProvidersUpdate => "providers:update",
            Permission::ProvidersDelete => "providers:delete",
            Permission::DocumentsRead => "documents:read",
            Permission::DocumentsUpload => "documents:upload",
            Permission::DocumentsDelete => "documents:delete",
            Permission::CatalogsRead => "catalogs:read",
            Permission::CatalogsManage => "catalogs:manage",
            Permission::LocationsRead => "locations:read",
            Permission::LocationsManage => "locations:manage",
            Permission::AdminFullAccess => "admin:full_access",
            Permission::AdminViewMetrics => "admin:view_metrics",
        }
    }

    /// Returns the functional module this permission belongs to
    pub fn module(&self) -> &'static str {
        match self {
            Permission::None => "none",
            Permission::UsersRead
            | Permission::UsersCreate
            | Permission::UsersUpdate
            | Permission::UsersDelete => "users",
            Permission::ProvidersRead
            | Permission::ProvidersCreate
            | Permission::ProvidersUpdate
            | Permission::ProvidersDelete => "providers",
            Permission::DocumentsRead
            | Permission::DocumentsUpload
            | Permission::DocumentsDelete => "documents",
            Permission::CatalogsRead | Permission::CatalogsManage => {
                "catalogs"
            }
            Permission::LocationsRead | Permission::LocationsManage => {
                "locations"
            }
            Permission::AdminFullAccess | Permission::AdminViewMetrics => {
                "admin"
            }
        }
    }

    /// Decodes a canonical permission string
    ///
    /// Empty, whitespace-only, and unrecognized input all yield `None`.  This
    /// never panics: unknown permission strings are an expected input (stale
    /// cache entries, claims minted by a newer version).
    pub fn parse(s: &str) -> Option<Permission> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Permission::iter().find(|p| p.name() == s)
    }

    /// Lists every catalog permission belonging to `module`
    /// (case-insensitive)
    ///
    /// An unknown module yields an empty list, not an error.
    pub fn by_module(module: &str) -> Vec<Permission> {
        Permission::iter()
            .filter(|p| *p != Permission::None)
            .filter(|p| p.module().eq_ignore_ascii_case(module.trim()))
            .collect()
    }

    /// Lists every module represented in the catalog, sorted
    pub fn all_modules() -> Vec<&'static str> {
        Permission::iter()
            .filter(|p| *p != Permission::None)
            .map(|p| p.module())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Permission {
    type Err = atrium_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s).ok_or_else(|| {
            atrium_common::Error::invalid_value(
                "permission",
                format!("unknown permission {:?}", s),
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::Permission;
    use strum::IntoEnumIterator;

    #[test]
    fn test_encoding_round_trips() {
        for permission in Permission::iter() {
            let encoded = permission.name();
            assert_eq!(Permission::parse(encoded), Some(permission));
            assert_eq!(encoded.parse::<Permission>().unwrap(), permission);
        }
    }

    #[test]
    fn test_encodings_are_unique() {
        let names: std::collections::BTreeSet<_> =
            Permission::iter().map(|p| p.name()).collect();
        assert_eq!(names.len(), Permission::iter().count());
    }

    #[test]
    fn test_module_matches_encoding_prefix() {
        for permission in Permission::iter() {
            let module = permission.module();
            assert!(!module.is_empty());
            assert_eq!(module, module.to_lowercase());
            assert!(permission.name().starts_with(&format!("{}:", module)));
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Permission::parse(""), None);
        assert_eq!(Permission::parse("   "), None);
        assert_eq!(Permission::parse("bogus:value"), None);
        assert_eq!(Permission::parse("users"), None);
        // Decoding is case-sensitive: the canonical form is lowercase.
        assert_eq!(Permission::parse("USERS:READ"), None);
        assert!("bogus:value".parse::<Permission>().is_err());
    }

    #[test]
    fn test_by_module() {
        let users = Permission::by_module("users");
        assert_eq!(
            users,
            vec![
                Permission::UsersRead,
                Permission::UsersCreate,
                Permission::UsersUpdate,
                Permission::UsersDelete,
            ]
        );
        // Module matching is case-insensitive.
        assert_eq!(Permission::by_module("Users"), users);
        assert_eq!(Permission::by_module("USERS"), users);
        // Unknown modules are empty, not an error.
        assert!(Permission::by_module("nonexistent").is_empty());
        // The placeholder never shows up in listings.
        assert!(Permission::by_module("none").is_empty());
    }

    #[test]
    fn test_all_modules() {
        assert_eq!(
            Permission::all_modules(),
            vec![
                "admin",
                "catalogs",
                "documents",
                "locations",
                "providers",
                "users",
            ]
        );
    }
}
