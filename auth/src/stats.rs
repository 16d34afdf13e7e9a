// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission system counters
//!
//! These feed the self-monitoring probe.  Counters are monotonic and updated
//! by the aggregation service on every call; the probe only ever reads a
//! [`StatsSnapshot`].

use serde::Serialize;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

#[derive(Debug, Default)]
pub struct PermissionStats {
    total_checks: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    active_checks: AtomicU64,
}

impl PermissionStats {
    pub fn record_check(&self) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a permission computation as in flight for as long as the
    /// returned guard lives
    pub fn begin_check(&self) -> ActiveCheckGuard<'_> {
        self.active_checks.fetch_add(1, Ordering::Relaxed);
        ActiveCheckGuard { stats: self }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let cache_hit_rate =
            if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 };
        StatsSnapshot {
            total_checks: self.total_checks.load(Ordering::Relaxed),
            cache_hit_rate,
            active_checks: self.active_checks.load(Ordering::Relaxed),
        }
    }
}

/// RAII guard for the in-flight check gauge
pub struct ActiveCheckGuard<'a> {
    stats: &'a PermissionStats,
}

impl Drop for ActiveCheckGuard<'_> {
    fn drop(&mut self) {
        self.stats.active_checks.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the permission system counters
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatsSnapshot {
    pub total_checks: u64,
    /// Fraction of cache lookups that hit, in `0..=1` (0 when there have
    /// been no lookups)
    pub cache_hit_rate: f64,
    pub active_checks: u64,
}
