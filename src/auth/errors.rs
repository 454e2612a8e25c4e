//! # Auth Errors

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the message never says which
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    /// No bearer token or cookie on a guarded route
    #[error("Not authorized to access this route")]
    AuthenticationRequired,

    /// Signed token for an account that has since been deleted
    #[error("No user found for this token")]
    UnknownTokenUser,

    #[error("User role {0} is not authorized to access this route")]
    Forbidden(String),

    /// Reset token unknown, already used, or past `resetPasswordExpire`
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Internal error: password hashing failed")]
    HashingFailed,

    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    #[error("Email could not be sent: {0}")]
    EmailError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        use AuthError::*;
        match self {
            WeakPassword(_) | InvalidResetToken => 400,
            InvalidCredentials
            | MalformedToken
            | TokenExpired
            | InvalidSignature
            | AuthenticationRequired
            | UnknownTokenUser => 401,
            Forbidden(_) => 403,
            HashingFailed | TokenGenerationFailed | EmailError(_) | StorageError(_) => 500,
        }
    }

    /// Caller mistakes, logged at warn rather than error
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::UnknownTokenUser.status_code(), 401);
        assert_eq!(AuthError::Forbidden("user".to_string()).status_code(), 403);
        assert_eq!(AuthError::InvalidResetToken.status_code(), 400);
        assert_eq!(AuthError::EmailError("smtp down".to_string()).status_code(), 500);
    }

    #[test]
    fn test_invalid_credentials_is_generic() {
        let message = AuthError::InvalidCredentials.to_string();
        assert!(!message.contains("password"));
        assert!(!message.contains("email"));
    }

    #[test]
    fn test_forbidden_names_role() {
        let err = AuthError::Forbidden("user".to_string());
        assert_eq!(err.to_string(), "User role user is not authorized to access this route");
        assert!(err.is_client_error());
        assert!(!AuthError::HashingFailed.is_client_error());
    }
}
