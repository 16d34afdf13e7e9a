// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity provider client
//!
//! Only the role-mapping resolver talks to the identity provider, and only
//! to read a user's realm-role assignments.  Token issuance and validation
//! live elsewhere.  Failures here are wrapped in `anyhow` and handled at the
//! resolver boundary; nothing in this module propagates past it.

use crate::config::IdentityProviderConfig;
use anyhow::Context;
use async_trait::async_trait;
use atrium_common::UserId;
use serde::Deserialize;
use slog::debug;
use slog::Logger;

/// Read-only view of the identity provider's role assignments
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    /// Returns the names of the realm roles assigned to `user_id`
    async fn realm_roles(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<String>, anyhow::Error>;
}

/// Keycloak implementation of [`IdentityProviderClient`]
///
/// Authenticates with the client-credentials grant, then reads the user's
/// realm-level role mappings from the admin API.
pub struct KeycloakClient {
    log: Logger,
    client: reqwest::Client,
    config: IdentityProviderConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct RoleRepresentation {
    name: String,
}

impl KeycloakClient {
    pub fn new(log: Logger, config: IdentityProviderConfig) -> KeycloakClient {
        KeycloakClient { log, client: reqwest::Client::new(), config }
    }

    /// As [`KeycloakClient::new`], but with a caller-supplied
    /// `reqwest::Client` (timeout policy belongs to the caller)
    pub fn new_with_client(
        log: Logger,
        config: IdentityProviderConfig,
        client: reqwest::Client,
    ) -> KeycloakClient {
        KeycloakClient { log, client, config }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn service_token(&self) -> Result<String, anyhow::Error> {
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url(),
            self.config.realm,
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .context("requesting service token")?
            .error_for_status()
            .context("service token request rejected")?;
        let token: TokenResponse =
            response.json().await.context("parsing token response")?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProviderClient for KeycloakClient {
    async fn realm_roles(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<String>, anyhow::Error> {
        let token = self.service_token().await?;
        let url = format!(
            "{}/admin/realms/{}/users/{}/role-mappings/realm",
            self.base_url(),
            self.config.realm,
            user_id,
        );
        let roles: Vec<RoleRepresentation> = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("requesting realm role mappings")?
            .error_for_status()
            .context("realm role mapping request rejected")?
            .json()
            .await
            .context("parsing realm role mappings")?;
        debug!(self.log, "fetched realm roles";
            "user_id" => %user_id,
            "count" => roles.len(),
        );
        Ok(roles.into_iter().map(|r| r.name).collect())
    }
}
