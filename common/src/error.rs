// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error handling facilities for the Atrium control plane

use serde::Deserialize;
use serde::Serialize;

/// An error that can be generated within a control plane component
///
/// These may be generated while handling a client request or as part of
/// background operation.  Where possible we reuse existing variants rather
/// than inventing new ones to distinguish cases that no programmatic consumer
/// needs to distinguish.
#[derive(Clone, Debug, Deserialize, thiserror::Error, PartialEq, Serialize)]
pub enum Error {
    /// The specified input field is not valid.
    #[error("Invalid Value: {label}, {message}")]
    InvalidValue { label: String, message: String },
    /// Authentication credentials were required but either missing or invalid.
    /// The HTTP status code is called "Unauthorized", but it's more accurate
    /// to call it "Unauthenticated".
    #[error("Missing or invalid credentials")]
    Unauthenticated { internal_message: String },
    /// The request is not authorized to perform the requested operation.
    #[error("Forbidden")]
    Forbidden,
    /// The system encountered an unhandled operational error.
    #[error("Internal Error: {internal_message}")]
    InternalError { internal_message: String },
    /// The system (or part of it) is unavailable.
    #[error("Service Unavailable: {internal_message}")]
    ServiceUnavailable { internal_message: String },
}

impl Error {
    pub fn invalid_value<L, M>(label: L, message: M) -> Error
    where
        L: ToString,
        M: ToString,
    {
        Error::InvalidValue {
            label: label.to_string(),
            message: message.to_string(),
        }
    }

    pub fn internal_error(internal_message: &str) -> Error {
        Error::InternalError { internal_message: internal_message.to_owned() }
    }

    pub fn unavail(internal_message: &str) -> Error {
        Error::ServiceUnavailable {
            internal_message: internal_message.to_owned(),
        }
    }

    /// Returns whether the error is likely transient and could reasonably be
    /// retried
    pub fn retryable(&self) -> bool {
        match self {
            Error::ServiceUnavailable { .. } => true,

            Error::InvalidValue { .. }
            | Error::Unauthenticated { .. }
            | Error::Forbidden
            | Error::InternalError { .. } => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn test_display_forms() {
        let error = Error::invalid_value("user_id", "must not be empty");
        assert_eq!(
            error.to_string(),
            "Invalid Value: user_id, must not be empty"
        );
        assert_eq!(Error::Forbidden.to_string(), "Forbidden");
    }

    #[test]
    fn test_retryable() {
        assert!(Error::unavail("cache down").retryable());
        assert!(!Error::Forbidden.retryable());
        assert!(!Error::internal_error("boom").retryable());
    }
}
