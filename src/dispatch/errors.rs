//! # Action Errors
//!
//! Failure taxonomy for resource actions. Every variant maps to an
//! [`Outcome`] and an HTTP status; a lookup that finds nothing and a
//! denied request are *successful* queries with a client-error status,
//! kept distinct from operations that actually failed.

use thiserror::Error;

use super::envelope::Outcome;
use crate::auth::AuthError;
use crate::geo::GeocodeError;
use crate::models::ValidationError;
use crate::seed::SeedError;
use crate::store::StoreError;

/// Result type for resource actions
pub type ActionResult = Result<super::envelope::ResultEnvelope, ActionError>;

/// Resource action errors
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// Query succeeded but matched nothing (Success, 404)
    #[error("{0}")]
    NotFound(String),

    /// Role, ownership or business rule refused the request (Success, 4xx)
    #[error("{message}")]
    Denied { status: u16, message: String },

    /// Input rejected by validation or a unique index (Failure, 400)
    #[error("{0}")]
    Invalid(String),

    /// Store or collaborator failure (Failure, 500)
    #[error("{0}")]
    Operation(String),
}

impl ActionError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ActionError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ActionError::Denied {
            status: 400,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ActionError::Denied {
            status: 401,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ActionError::Denied {
            status: 403,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ActionError::NotFound(_) => 404,
            ActionError::Denied { status, .. } => *status,
            ActionError::Invalid(_) => 400,
            ActionError::Operation(_) => 500,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ActionError::NotFound(_) | ActionError::Denied { .. } => Outcome::Success,
            ActionError::Invalid(_) | ActionError::Operation(_) => Outcome::Failure,
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { .. } => {
                ActionError::Invalid(format!("Duplicate field value entered: {}", err))
            }
            StoreError::InvalidDocument(msg) => ActionError::Invalid(msg),
            other => ActionError::Operation(other.to_string()),
        }
    }
}

impl From<ValidationError> for ActionError {
    fn from(err: ValidationError) -> Self {
        ActionError::Invalid(err.0)
    }
}

impl From<AuthError> for ActionError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WeakPassword(_) => ActionError::Invalid(err.to_string()),
            ref e if e.is_client_error() => ActionError::Denied {
                status: e.status_code(),
                message: e.to_string(),
            },
            other => ActionError::Operation(other.to_string()),
        }
    }
}

impl From<GeocodeError> for ActionError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NoMatch(_) => ActionError::bad_request(err.to_string()),
            other => ActionError::Operation(other.to_string()),
        }
    }
}

impl From<SeedError> for ActionError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Store(store) => store.into(),
            other => ActionError::Operation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        let not_found = ActionError::not_found("No bootcamp with id 1");
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.outcome(), Outcome::Success);

        let denied = ActionError::forbidden("no");
        assert_eq!(denied.status_code(), 403);
        assert_eq!(denied.outcome(), Outcome::Success);

        let op = ActionError::Operation("disk on fire".to_string());
        assert_eq!(op.status_code(), 500);
        assert_eq!(op.outcome(), Outcome::Failure);
    }

    #[test]
    fn test_duplicate_key_is_invalid_input() {
        let err: ActionError = StoreError::DuplicateKey {
            collection: "bootcamps".to_string(),
            fields: "name".to_string(),
        }
        .into();

        assert_eq!(err.status_code(), 400);
        assert_eq!(err.outcome(), Outcome::Failure);
    }

    #[test]
    fn test_auth_error_mapping() {
        let denied: ActionError = AuthError::InvalidCredentials.into();
        assert_eq!(denied.status_code(), 401);
        assert_eq!(denied.outcome(), Outcome::Success);

        let failed: ActionError = AuthError::EmailError("smtp down".to_string()).into();
        assert_eq!(failed.status_code(), 500);
        assert_eq!(failed.outcome(), Outcome::Failure);
    }
}
