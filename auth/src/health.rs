// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Self-monitoring probe for the permission system
//!
//! Exercises the aggregation service end to end against a synthetic system
//! user and inspects the live stats snapshot, accumulating a list of
//! distinct issues.  The verdict follows a fixed rule: no issues is
//! `Healthy`, exactly one is `Degraded`, two or more is `Unhealthy`.  The
//! probe itself never fails; every observation becomes at most one issue.

use crate::permissions::Permission;
use crate::service::PermissionService;
use atrium_common::UserId;
use serde::Serialize;
use serde_json::json;
use slog::warn;
use slog::Logger;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Round trips slower than this count as an issue
pub const ROUND_TRIP_LATENCY_LIMIT: Duration = Duration::from_secs(2);

/// The hit-rate check only applies once this many checks have been recorded
const HIT_RATE_MIN_CHECKS: u64 = 100;
const HIT_RATE_FLOOR: f64 = 0.70;
const ACTIVE_CHECKS_CEILING: u64 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Structured probe result, suitable for a health endpoint payload
#[derive(Clone, Debug, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub description: String,
    pub data: BTreeMap<String, serde_json::Value>,
}

pub struct PermissionsHealthCheck {
    log: Logger,
    service: Arc<PermissionService>,
    system_user: UserId,
}

impl PermissionsHealthCheck {
    pub fn new(
        log: Logger,
        service: Arc<PermissionService>,
        system_user: UserId,
    ) -> PermissionsHealthCheck {
        PermissionsHealthCheck { log, service, system_user }
    }

    pub async fn check(&self) -> HealthCheckResult {
        let mut issues: Vec<String> = Vec::new();
        let mut data = BTreeMap::new();

        // Basic functionality: a resolve-then-check round trip against the
        // synthetic system user.
        let started = Instant::now();
        let permissions =
            self.service.get_user_permissions(&self.system_user).await;
        let probe_permission = permissions
            .first()
            .copied()
            .unwrap_or(Permission::AdminViewMetrics);
        let _ = self
            .service
            .has_permission(&self.system_user, probe_permission)
            .await;
        let elapsed = started.elapsed();
        data.insert(
            "round_trip_ms".to_string(),
            json!(elapsed.as_millis() as u64),
        );
        if elapsed > ROUND_TRIP_LATENCY_LIMIT {
            issues.push(format!(
                "permission round trip took {} ms",
                elapsed.as_millis(),
            ));
            data.insert("basic_functionality".to_string(), json!("slow"));
        } else {
            data.insert("basic_functionality".to_string(), json!("ok"));
        }

        // Performance metrics, read from the live snapshot.
        let snapshot = self.service.stats_snapshot();
        data.insert(
            "total_checks".to_string(),
            json!(snapshot.total_checks),
        );
        data.insert(
            "cache_hit_rate".to_string(),
            json!(snapshot.cache_hit_rate),
        );
        data.insert(
            "active_checks".to_string(),
            json!(snapshot.active_checks),
        );
        let mut metrics_ok = true;
        if snapshot.total_checks >= HIT_RATE_MIN_CHECKS
            && snapshot.cache_hit_rate < HIT_RATE_FLOOR
        {
            issues.push(format!(
                "cache hit rate {:.2} is below {:.2}",
                snapshot.cache_hit_rate, HIT_RATE_FLOOR,
            ));
            metrics_ok = false;
        }
        if snapshot.active_checks > ACTIVE_CHECKS_CEILING {
            issues.push(format!(
                "{} permission checks in flight (ceiling {})",
                snapshot.active_checks, ACTIVE_CHECKS_CEILING,
            ));
            metrics_ok = false;
        }
        data.insert(
            "performance_metrics".to_string(),
            json!(if metrics_ok { "ok" } else { "degraded" }),
        );

        // Resolver inventory.
        let resolvers = self.service.resolver_names();
        data.insert("resolver_count".to_string(), json!(resolvers.len()));
        data.insert("resolvers".to_string(), json!(resolvers));

        let status = match issues.len() {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        let description = if issues.is_empty() {
            "permission system operating normally".to_string()
        } else {
            issues.join("; ")
        };
        if status != HealthStatus::Healthy {
            warn!(self.log, "permission system health probe found issues";
                "status" => ?status,
                "issues" => issues.len(),
            );
        }
        HealthCheckResult { status, description, data }
    }
}
