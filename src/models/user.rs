//! User model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_valid_email, ValidationError, Validator};
use crate::auth::crypto::PasswordPolicy;
use crate::store::document::{now_timestamp, Document};

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Publisher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "publisher" => Some(Role::Publisher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-supplied user fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Plain text; only its hash is ever stored
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl UserInput {
    /// Validate a new account. Only the admin API may grant `admin`.
    pub fn validate_new(&self, allow_admin: bool) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.require_text(&self.name, "Please add a name");
        v.require_text(&self.email, "Please add an email");
        v.require_text(&self.password, "Please add a password");
        if let Some(password) = &self.password {
            let policy = PasswordPolicy::default();
            v.check(
                password.chars().count() >= policy.min_length,
                format!("Password must be at least {} characters", policy.min_length),
            );
        }
        self.check_fields(&mut v, allow_admin);
        v.finish()
    }

    /// Validate the present fields of an update
    pub fn validate_patch(&self, allow_admin: bool) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if self.name.is_some() {
            v.require_text(&self.name, "Please add a name");
        }
        self.check_fields(&mut v, allow_admin);
        v.finish()
    }

    fn check_fields(&self, v: &mut Validator, allow_admin: bool) {
        if let Some(email) = &self.email {
            v.check(is_valid_email(email), "Please add a valid email address");
        }
        if !allow_admin {
            v.check(
                self.role != Some(Role::Admin),
                "Role admin can not be self-assigned",
            );
        }
    }

    /// Stored fields, without the password
    pub fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }

    /// Document for a new account holding `password_hash`
    pub fn to_new_document(&self, password_hash: String) -> Document {
        let mut doc = self.to_document();
        doc.entry("role".to_string())
            .or_insert(Value::String(Role::User.as_str().to_string()));
        doc.insert("password".to_string(), Value::String(password_hash));
        doc.insert("createdAt".to_string(), Value::String(now_timestamp()));
        doc
    }
}
