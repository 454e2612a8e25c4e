//! # Session Tokens
//!
//! HS256 JSON Web Tokens naming the user by id. Validation is stateless;
//! the guard looks the user up afterwards to learn the current role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC signing secret (`JWT_SECRET`)
    pub secret: String,
    /// Token lifetime (`JWT_EXPIRE`)
    pub access_token_ttl: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_ttl: Duration::days(30),
        }
    }
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct JwtManager {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            ttl: config.access_token_ttl,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Signed token for `user_id`, expiring after the configured lifetime
    pub fn generate_access_token(&self, user_id: &str) -> AuthResult<String> {
        let issued = Utc::now();
        let claims = JwtClaims {
            id: user_id.to_string(),
            iat: issued.timestamp(),
            exp: (issued + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    /// Verify signature and expiry
    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: secret.to_string(),
            access_token_ttl: Duration::days(30),
        })
    }

    #[test]
    fn test_round_trip() {
        let jwt = manager("devcamper");
        let token = jwt.generate_access_token("5d7a514b5d2c12c7449be042").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.id, "5d7a514b5d2c12c7449be042");
        assert_eq!(claims.exp - claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            manager("devcamper").validate_token("none"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = manager("one").generate_access_token("u1").unwrap();
        assert!(matches!(
            manager("two").validate_token(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_rejected() {
        let now = Utc::now();
        let claims = JwtClaims {
            id: "u1".to_string(),
            iat: (now - Duration::days(31)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"devcamper")).unwrap();
        assert!(matches!(
            manager("devcamper").validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }
}
