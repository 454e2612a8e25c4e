//! Request Context
//!
//! Context carried from the route into every action: request id for
//! tracing, the resolved caller, and the start time for duration logging.

use std::time::Instant;

use uuid::Uuid;

use crate::models::Role;

/// Context carried through dispatch
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Resolved caller, if authenticated
    pub auth: Option<AuthContext>,

    started_at: Instant,
}

impl RequestContext {
    /// Create a context for a caller
    pub fn new(auth: Option<AuthContext>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            auth,
            started_at: Instant::now(),
        }
    }

    /// Create an anonymous context
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn authenticated(auth: AuthContext) -> Self {
        Self::new(Some(auth))
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may modify a resource
    pub fn can_modify(&self, owner: Option<&str>) -> bool {
        self.is_admin() || owner == Some(self.user_id.as_str())
    }
}
