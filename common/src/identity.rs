// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Strongly-typed identifiers
//!
//! We use a newtype per kind of identifier rather than passing bare `Uuid`s
//! around so that an id for one kind of object cannot be quietly used where
//! an id for another kind was expected.

use crate::Error;
use serde::Serialize;
use uuid::Uuid;

/// Identifies a user account
///
/// A `UserId` is always a valid, non-nil UUID.  Construction from an external
/// string goes through [`UserId::parse_str`] (or `FromStr`), which rejects
/// malformed and nil input.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a fresh random user id (used for tests and synthetic system
    /// users)
    pub fn new_v4() -> UserId {
        UserId(Uuid::new_v4())
    }

    /// Parses a `UserId` from an externally-supplied string
    pub fn parse_str(s: &str) -> Result<UserId, Error> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::invalid_value(
                "user_id",
                "user id must not be empty",
            ));
        }
        let id = Uuid::parse_str(s).map_err(|e| {
            Error::invalid_value("user_id", format!("not a valid UUID: {}", e))
        })?;
        if id.is_nil() {
            return Err(Error::invalid_value(
                "user_id",
                "user id must not be the nil UUID",
            ));
        }
        Ok(UserId(id))
    }

    pub fn into_untyped_uuid(self) -> Uuid {
        self.0
    }
}

impl std::str::FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::parse_str(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> serde::Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<UserId, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = Uuid::deserialize(deserializer)?;
        if id.is_nil() {
            return Err(serde::de::Error::custom(
                "user id must not be the nil UUID",
            ));
        }
        Ok(UserId(id))
    }
}

#[cfg(test)]
mod test {
    use super::UserId;

    #[test]
    fn test_parse_valid() {
        let id = UserId::parse_str("5b9c5feb-5777-4f2c-adb7-a6b409527cf8")
            .unwrap();
        assert_eq!(
            id.to_string(),
            "5b9c5feb-5777-4f2c-adb7-a6b409527cf8"
        );
        // Round-trips through FromStr, too.
        assert_eq!(id, id.to_string().parse::<UserId>().unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "   ", "not-a-uuid", "1234", "users:read"] {
            let error = UserId::parse_str(bad).unwrap_err();
            assert!(
                matches!(error, crate::Error::InvalidValue { .. }),
                "expected InvalidValue for {:?}, got {:?}",
                bad,
                error
            );
        }
    }

    #[test]
    fn test_parse_rejects_nil() {
        let error = UserId::parse_str("00000000-0000-0000-0000-000000000000")
            .unwrap_err();
        assert_eq!(
            error,
            crate::Error::invalid_value(
                "user_id",
                "user id must not be the nil UUID"
            )
        );
    }
}
