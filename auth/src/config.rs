// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for the permission subsystem

use atrium_common::UserId;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Connection settings for the identity provider used by the role-mapping
/// resolver
#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
pub struct IdentityProviderConfig {
    /// Base URL of the identity provider, e.g. `https://sso.example.com`
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for IdentityProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Hand-written so the client secret never lands in log output.
        f.debug_struct("IdentityProviderConfig")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Top-level configuration for the permission subsystem
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PermissionsConfig {
    /// How long a computed permission snapshot stays cached
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Synthetic user exercised by the health probe
    pub system_user_id: UserId,

    /// Identity provider settings; when absent, the role-mapping resolver is
    /// not registered
    #[serde(default)]
    pub identity_provider: Option<IdentityProviderConfig>,
}

impl PermissionsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
