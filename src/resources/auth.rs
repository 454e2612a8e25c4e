//! Account actions: registration, login, password reset and self-service
//! account management. Token-issuing actions answer with a token envelope
//! whose cookie carries the signed JWT.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::caller;
use crate::auth::cookie::{CookieOptions, SetCookie, TOKEN_COOKIE};
use crate::auth::crypto::{hash_password, verify_password, PasswordPolicy, ResetToken};
use crate::auth::email::{EmailSender, EmailTemplate};
use crate::auth::errors::AuthError;
use crate::auth::jwt::JwtManager;
use crate::dispatch::{Action, ActionError, ActionResult, RequestContext, ResultEnvelope};
use crate::models::{UserInput, ValidationError};
use crate::store::document::{document_id, now_timestamp, str_field};
use crate::store::{Document, FilterExpr, FilterSet, FindOptions, StoreHandle};

/// Lifetime of a password reset token, in minutes
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Signs tokens and wraps them in the token cookie
#[derive(Clone)]
pub struct TokenIssuer {
    jwt: Arc<JwtManager>,
    cookie_days: i64,
    secure: bool,
}

impl TokenIssuer {
    pub fn new(jwt: Arc<JwtManager>, cookie_days: i64, secure: bool) -> Self {
        Self {
            jwt,
            cookie_days,
            secure,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Token envelope for `user`
    pub fn issue(&self, user: &Document, status: u16) -> ActionResult {
        let user_id = document_id(user).ok_or_else(|| ActionError::Operation("User has no id".to_string()))?;
        let token = self.jwt.generate_access_token(user_id)?;
        let cookie = SetCookie::new(
            TOKEN_COOKIE,
            token,
            CookieOptions::for_days(self.cookie_days, self.secure),
        );
        Ok(ResultEnvelope::token(status, cookie))
    }
}

/// Logout response: an empty object and a token cookie expiring in 10 s
pub fn logout_envelope() -> ResultEnvelope {
    ResultEnvelope::ok(Value::Object(Document::new()))
        .with_cookie(SetCookie::new(TOKEN_COOKIE, "none", CookieOptions::expiring(10)))
}

/// Email and password, as sent to login and account deletion
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn required(&self) -> Result<(&str, &str), ActionError> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => Ok((email, password)),
            _ => Err(ActionError::bad_request("Please provide an email and password")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

fn check_password(password: Option<&str>) -> Result<&str, ActionError> {
    let password = password.ok_or_else(|| ValidationError("Please add a password".to_string()))?;
    PasswordPolicy::default().validate(password)?;
    Ok(password)
}

async fn user_by_email(store: &StoreHandle, email: &str) -> Result<Option<Document>, ActionError> {
    Ok(store
        .users()
        .with_hidden()
        .find_one(FilterSet::by("email", email.trim()))
        .await?)
}

/// `POST /auth/register`
pub struct Register {
    pub input: UserInput,
    pub issuer: TokenIssuer,
}

#[async_trait]
impl Action for Register {
    fn name(&self) -> &'static str {
        "register"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        self.input.validate_new(false)?;
        let password = check_password(self.input.password.as_deref())?;

        let user = store
            .users()
            .create(self.input.to_new_document(hash_password(password)?))
            .await?;
        info!(user = ?document_id(&user), "user registered");
        self.issuer.issue(&user, 201)
    }
}

/// `POST /auth/login`
pub struct Login {
    pub credentials: Credentials,
    pub issuer: TokenIssuer,
}

#[async_trait]
impl Action for Login {
    fn name(&self) -> &'static str {
        "login"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let (email, password) = self.credentials.required()?;
        let user = user_by_email(store, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = str_field(&user, "password").unwrap_or_default();
        if !verify_password(password, hash)? {
            warn!(user = ?document_id(&user), "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.issuer.issue(&user, 200)
    }
}

/// `GET /auth/whoami`
pub struct WhoAmI;

#[async_trait]
impl Action for WhoAmI {
    fn name(&self) -> &'static str {
        "whoami"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let user = store
            .users()
            .find_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No user with the id of {}", auth.user_id)))?;
        Ok(ResultEnvelope::ok(Value::Object(user)))
    }
}

/// `POST /auth/forgotpassword`
///
/// Stores only the digest of the reset token. The link is delivered by
/// email and never echoed back in the response.
pub struct ForgotPassword {
    pub email: Option<String>,
    /// Prefix of the reset link, e.g. `http://host/api/v1/auth/resetpassword`
    pub reset_base: String,
    pub sender: Arc<dyn EmailSender>,
}

#[async_trait]
impl Action for ForgotPassword {
    fn name(&self) -> &'static str {
        "forgot_password"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let email = self
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ActionError::bad_request("Please provide an email"))?;
        let user = user_by_email(store, email)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("There is no user with email {}", email)))?;
        let user_id = document_id(&user).unwrap_or_default().to_string();

        let token = ResetToken::generate();
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let mut patch = Document::new();
        patch.insert("resetPasswordToken".to_string(), Value::String(token.digest));
        patch.insert(
            "resetPasswordExpire".to_string(),
            Value::String(expires.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        store.users().update(&user_id, patch).await?;

        let template = EmailTemplate::PasswordReset {
            reset_url: format!("{}/{}", self.reset_base.trim_end_matches('/'), token.plain),
            user_email: str_field(&user, "email").unwrap_or(email).to_string(),
        };
        if let Err(e) = self.sender.send(template).await {
            warn!(user = %user_id, error = %e, "reset email failed, clearing token");
            let mut clear = Document::new();
            clear.insert("resetPasswordToken".to_string(), Value::Null);
            clear.insert("resetPasswordExpire".to_string(), Value::Null);
            store.users().update(&user_id, clear).await?;
            return Err(ActionError::Operation("Email could not be sent".to_string()));
        }

        info!(user = %user_id, "password reset email sent");
        Ok(ResultEnvelope::ok(Value::String("Email sent".to_string())))
    }
}

/// `PUT /auth/resetpassword/:token`
pub struct ResetPassword {
    pub token: String,
    pub password: Option<String>,
    pub issuer: TokenIssuer,
}

#[async_trait]
impl Action for ResetPassword {
    fn name(&self) -> &'static str {
        "reset_password"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let pending = store
            .users()
            .with_hidden()
            .find(&FindOptions::filtered(
                FilterSet::new().and(FilterExpr::gt("resetPasswordExpire", Value::String(now_timestamp()))),
            ))
            .await?;
        let user = pending
            .into_iter()
            .find(|u| {
                str_field(u, "resetPasswordToken")
                    .map(|stored| ResetToken::matches(stored, &self.token))
                    .unwrap_or(false)
            })
            .ok_or(AuthError::InvalidResetToken)?;
        let password = check_password(self.password.as_deref())?;
        let user_id = document_id(&user).unwrap_or_default().to_string();

        let mut patch = Document::new();
        patch.insert("password".to_string(), Value::String(hash_password(password)?));
        patch.insert("resetPasswordToken".to_string(), Value::Null);
        patch.insert("resetPasswordExpire".to_string(), Value::Null);
        let updated = store
            .users()
            .update(&user_id, patch)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        info!(user = %user_id, "password reset");
        self.issuer.issue(&updated, 200)
    }
}

/// `PUT /auth/updatedetails`; only name and email change
pub struct UpdateDetails {
    pub input: UserInput,
}

#[async_trait]
impl Action for UpdateDetails {
    fn name(&self) -> &'static str {
        "update_details"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let details = UserInput {
            name: self.input.name.clone(),
            email: self.input.email.clone(),
            ..UserInput::default()
        };
        details.validate_patch(false)?;

        let user = store
            .users()
            .update(&auth.user_id, details.to_document())
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No user with the id of {}", auth.user_id)))?;
        Ok(ResultEnvelope::ok(Value::Object(user)))
    }
}

/// `PUT /auth/updatepassword`
pub struct UpdatePassword {
    pub change: PasswordChange,
    pub issuer: TokenIssuer,
}

#[async_trait]
impl Action for UpdatePassword {
    fn name(&self) -> &'static str {
        "update_password"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let auth = caller(ctx)?;
        let user = store
            .users()
            .with_hidden()
            .find_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No user with the id of {}", auth.user_id)))?;

        let current = self.change.current_password.as_deref().unwrap_or_default();
        if !verify_password(current, str_field(&user, "password").unwrap_or_default())? {
            return Err(ActionError::bad_request("Password is incorrect"));
        }
        let password = check_password(self.change.new_password.as_deref())?;

        let mut patch = Document::new();
        patch.insert("password".to_string(), Value::String(hash_password(password)?));
        let updated = store
            .users()
            .update(&auth.user_id, patch)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No user with the id of {}", auth.user_id)))?;
        self.issuer.issue(&updated, 200)
    }
}

/// `DELETE /auth/delete`; the account is identified by its credentials
pub struct DeleteAccount {
    pub credentials: Credentials,
}

#[async_trait]
impl Action for DeleteAccount {
    fn name(&self) -> &'static str {
        "delete_account"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let (email, password) = self.credentials.required()?;
        let user = user_by_email(store, email)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("There is no user with email {}", email)))?;
        if !verify_password(password, str_field(&user, "password").unwrap_or_default())? {
            return Err(ActionError::bad_request("Password is incorrect"));
        }

        let user_id = document_id(&user).unwrap_or_default().to_string();
        let removed = store
            .users()
            .delete(&user_id)
            .await?
            .ok_or_else(|| ActionError::not_found(format!("No user with the id of {}", user_id)))?;
        info!(user = %user_id, "account deleted");
        Ok(ResultEnvelope::ok(Value::Object(removed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::email::MockEmailSender;
    use crate::auth::jwt::JwtConfig;
    use crate::dispatch::{execute, Outcome};
    use crate::models::{parse_input, Role};
    use crate::resources::testing::{as_user, store};
    use serde_json::json;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            Arc::new(JwtManager::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            30,
            false,
        )
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    async fn register(store: &StoreHandle, email: &str) -> String {
        let input: UserInput =
            parse_input(json!({"name": "Jane", "email": email, "password": "123456", "role": "publisher"})).unwrap();
        let envelope = execute(&RequestContext::anonymous(), store, &Register { input, issuer: issuer() }).await;
        assert_eq!(envelope.status, 201);
        let user = store.users().find_one(FilterSet::by("email", email)).await.unwrap().unwrap();
        document_id(&user).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_issues_token_and_hides_password() {
        let store = store().await;
        let input: UserInput =
            parse_input(json!({"name": "Jane", "email": "jane@example.com", "password": "123456"})).unwrap();

        let envelope = execute(&RequestContext::anonymous(), &store, &Register { input, issuer: issuer() }).await;
        let body = envelope.body().unwrap();

        assert_eq!(envelope.status, 201);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(envelope.cookie.as_ref().unwrap().name, TOKEN_COOKIE);

        let user = store.users().find_one(FilterSet::by("email", "jane@example.com")).await.unwrap().unwrap();
        assert!(user.get("password").is_none());
        assert_eq!(user["role"], "user");
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let store = store().await;
        let input: UserInput =
            parse_input(json!({"name": "Eve", "email": "eve@example.com", "password": "123456", "role": "admin"}))
                .unwrap();
        let envelope = execute(&RequestContext::anonymous(), &store, &Register { input, issuer: issuer() }).await;
        assert_eq!(envelope.status, 400);
    }

    #[tokio::test]
    async fn test_login() {
        let store = store().await;
        register(&store, "jane@example.com").await;

        let ok = execute(
            &RequestContext::anonymous(),
            &store,
            &Login {
                credentials: credentials("jane@example.com", "123456"),
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(ok.status, 200);

        let wrong = execute(
            &RequestContext::anonymous(),
            &store,
            &Login {
                credentials: credentials("jane@example.com", "nope-nope"),
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(wrong.status, 401);

        let missing = execute(
            &RequestContext::anonymous(),
            &store,
            &Login {
                credentials: Credentials::default(),
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(missing.status, 400);
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let store = store().await;
        let id = register(&store, "jane@example.com").await;
        let sender = Arc::new(MockEmailSender::new());

        let envelope = execute(
            &RequestContext::anonymous(),
            &store,
            &ForgotPassword {
                email: Some("jane@example.com".to_string()),
                reset_base: "http://localhost/api/v1/auth/resetpassword".to_string(),
                sender: sender.clone(),
            },
        )
        .await;
        assert_eq!(envelope.status, 200);
        assert_eq!(sender.sent_count(), 1);

        let Some(EmailTemplate::PasswordReset { reset_url, .. }) = sender.last_sent() else {
            panic!("no reset email");
        };
        let token = reset_url.rsplit('/').next().unwrap().to_string();

        let stored = store.users().with_hidden().find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored["resetPasswordToken"], ResetToken::digest_of(&token).as_str());

        let reset = execute(
            &RequestContext::anonymous(),
            &store,
            &ResetPassword {
                token: token.clone(),
                password: Some("654321".to_string()),
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(reset.status, 200);

        let stored = store.users().with_hidden().find_by_id(&id).await.unwrap().unwrap();
        assert!(stored.get("resetPasswordToken").is_none());
        assert!(verify_password("654321", stored["password"].as_str().unwrap()).unwrap());

        let reused = execute(
            &RequestContext::anonymous(),
            &store,
            &ResetPassword {
                token,
                password: Some("abcdef".to_string()),
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(reused.status, 400);
    }

    #[tokio::test]
    async fn test_failed_delivery_clears_reset_token() {
        let store = store().await;
        let id = register(&store, "jane@example.com").await;

        let envelope = execute(
            &RequestContext::anonymous(),
            &store,
            &ForgotPassword {
                email: Some("jane@example.com".to_string()),
                reset_base: "http://localhost".to_string(),
                sender: Arc::new(MockEmailSender::failing()),
            },
        )
        .await;
        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.outcome, Outcome::Failure);

        let stored = store.users().with_hidden().find_by_id(&id).await.unwrap().unwrap();
        assert!(stored.get("resetPasswordToken").is_none());
        assert!(stored.get("resetPasswordExpire").is_none());
    }

    #[tokio::test]
    async fn test_update_details_ignores_role() {
        let store = store().await;
        let id = register(&store, "jane@example.com").await;
        let input: UserInput = parse_input(json!({"name": "Janet", "role": "admin"})).unwrap();

        let envelope = execute(&as_user(&id, Role::Publisher), &store, &UpdateDetails { input }).await;
        let data = envelope.body().unwrap()["data"].clone();

        assert_eq!(data["name"], "Janet");
        assert_eq!(data["role"], "publisher");
    }

    #[tokio::test]
    async fn test_update_password_checks_current() {
        let store = store().await;
        let id = register(&store, "jane@example.com").await;
        let ctx = as_user(&id, Role::Publisher);

        let wrong = execute(
            &ctx,
            &store,
            &UpdatePassword {
                change: PasswordChange {
                    current_password: Some("bad".to_string()),
                    new_password: Some("7654321".to_string()),
                },
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(wrong.status, 400);

        let ok = execute(
            &ctx,
            &store,
            &UpdatePassword {
                change: PasswordChange {
                    current_password: Some("123456".to_string()),
                    new_password: Some("7654321".to_string()),
                },
                issuer: issuer(),
            },
        )
        .await;
        assert_eq!(ok.status, 200);
    }

    #[tokio::test]
    async fn test_delete_account_requires_password() {
        let store = store().await;
        register(&store, "jane@example.com").await;

        let wrong = execute(
            &RequestContext::anonymous(),
            &store,
            &DeleteAccount {
                credentials: credentials("jane@example.com", "bad-password"),
            },
        )
        .await;
        assert_eq!(wrong.status, 400);

        let ok = execute(
            &RequestContext::anonymous(),
            &store,
            &DeleteAccount {
                credentials: credentials("jane@example.com", "123456"),
            },
        )
        .await;
        assert_eq!(ok.status, 200);
        assert_eq!(store.users().count(&FilterSet::new()).await.unwrap(), 0);
    }

    #[test]
    fn test_logout_expires_cookie() {
        let envelope = logout_envelope();
        let cookie = envelope.cookie.unwrap();
        assert_eq!(cookie.value, "none");
        assert!(cookie.options.expires <= Utc::now() + Duration::seconds(10));
    }
}
