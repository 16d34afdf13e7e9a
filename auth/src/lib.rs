// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission resolution and enforcement for the Atrium control plane
//!
//! This crate computes, caches, materializes, and checks the fine-grained
//! permissions of an authenticated principal.  The pieces fit together like
//! this:
//!
//! * [`permissions`] defines the closed taxonomy of `module:action`
//!   capabilities.
//! * [`resolver`] defines the pluggable sources that grant permissions to a
//!   user (an identity-provider role mapping, a module-local entitlement
//!   table, ...).
//! * [`service`] fans out to every registered resolver, merges the results,
//!   and owns the tag-addressable cache in front of them.
//! * [`authn`] materializes resolved permissions as claims on a principal,
//!   exactly once per authentication event.
//! * [`authz`] makes the synchronous allow/deny decision against those
//!   claims.  It performs no I/O and never calls back into [`service`]; the
//!   hot path stays O(1) over data loaded up front.
//! * [`health`] is the self-monitoring probe that exercises the service end
//!   to end and reports a tri-state verdict.
//!
//! The split between loading permissions asynchronously ([`authn`]) and
//! deciding synchronously ([`authz`]) is deliberate: authorization decisions
//! happen on the request path for every protected operation, and we don't
//! want that path blocking on resolvers or the cache.

pub mod authn;
pub mod authz;
pub mod cache;
pub mod config;
pub mod health;
pub mod idp;
pub mod permissions;
pub mod resolver;
pub mod service;
pub mod stats;

pub use permissions::Permission;
pub use service::PermissionService;
