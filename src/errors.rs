//! Unified error type for the business-state store.
//!
//! Every fallible operation in the crate returns [`Result`]. Storage failures from
//! `SeaORM` are folded into [`Error::Persistence`] so callers only ever see the
//! categories below.

use thiserror::Error;

/// Generic message shown to the user for any failure that reaches the UI boundary.
pub const USER_FACING_MESSAGE: &str = "Something went wrong. Please try again.";

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Lookup or update of a record id that does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of record (e.g. "product")
        kind: &'static str,
        /// The id that was requested
        id: String,
    },

    /// The underlying storage failed to read or write
    #[error("Persistence error: {message}")]
    Persistence {
        /// Backend error text
        message: String,
    },

    /// Malformed input reached a store boundary
    #[error("Validation error: {message}")]
    Validation {
        /// Which rule was violated
        message: String,
    },

    /// A monetary amount was negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A premium feature was requested without an active subscription
    #[error("Subscription is not active (status: {status})")]
    SubscriptionInactive {
        /// Current subscription status, or "none"
        status: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Persistence`] with the given message.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// The single message category exposed past the UI boundary.
    ///
    /// Detail stays in logs; callers render this text alongside a retry affordance.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        USER_FACING_MESSAGE
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Persistence {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_becomes_persistence() {
        let err: Error = sea_orm::DbErr::Custom("disk full".to_string()).into();
        assert!(matches!(err, Error::Persistence { .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_user_message_is_generic() {
        let not_found = Error::NotFound {
            kind: "product",
            id: "abc".to_string(),
        };
        let invalid = Error::validation("price must be a number");
        assert_eq!(not_found.user_message(), invalid.user_message());
        assert!(!not_found.is_retryable());
        assert!(!not_found.user_message().contains("abc"));
    }
}
