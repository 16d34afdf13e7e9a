// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types shared across the Atrium control plane
//!
//! This crate holds the error type used throughout the system and the
//! strongly-typed identifiers that cross component boundaries.  Components
//! should remain agnostic to the transport with which the system communicates
//! with clients; errors defined here are converted to transport-level errors
//! (if at all) at the outermost layer.

mod error;
mod identity;

pub use error::Error;
pub use identity::UserId;
