//! User administration. Route guards restrict these actions to admins.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::advanced::{advanced_results, ListQuery};
use super::to_values;
use crate::auth::crypto::{hash_password, PasswordPolicy};
use crate::dispatch::{Action, ActionError, ActionResult, RequestContext, ResultEnvelope};
use crate::models::UserInput;
use crate::store::StoreHandle;

fn not_found(id: &str) -> ActionError {
    ActionError::not_found(format!("No user with the id of {}", id))
}

/// `GET /admin`
pub struct ListUsers {
    pub query: ListQuery,
}

#[async_trait]
impl Action for ListUsers {
    fn name(&self) -> &'static str {
        "list_users"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let (users, pagination) = advanced_results(store.users(), &self.query).await?;
        Ok(ResultEnvelope::paginated(to_values(users), pagination))
    }
}

/// `GET /admin/:id`
pub struct GetUser {
    pub id: String,
}

#[async_trait]
impl Action for GetUser {
    fn name(&self) -> &'static str {
        "get_user"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        let user = store
            .users()
            .find_by_id(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(Value::Object(user)))
    }
}

/// `POST /admin` and `POST /admin/register`; any role may be granted
pub struct CreateUser {
    pub input: UserInput,
}

#[async_trait]
impl Action for CreateUser {
    fn name(&self) -> &'static str {
        "create_user"
    }

    async fn run(&self, ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        self.input.validate_new(true)?;
        let password = self.input.password.as_deref().unwrap_or_default();
        PasswordPolicy::default().validate(password)?;

        let user = store
            .users()
            .create(self.input.to_new_document(hash_password(password)?))
            .await?;
        info!(user = ?user.get("_id"), admin = ?ctx.auth.as_ref().map(|a| &a.user_id), "user created by admin");
        Ok(ResultEnvelope::created(Value::Object(user)))
    }
}

/// `PUT /admin/:id`
pub struct UpdateUser {
    pub id: String,
    pub input: UserInput,
}

#[async_trait]
impl Action for UpdateUser {
    fn name(&self) -> &'static str {
        "update_user"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        self.input.validate_patch(true)?;

        let mut patch = self.input.to_document();
        if let Some(password) = &self.input.password {
            PasswordPolicy::default().validate(password)?;
            patch.insert("password".to_string(), Value::String(hash_password(password)?));
        }

        let user = store
            .users()
            .update(&self.id, patch)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        Ok(ResultEnvelope::ok(Value::Object(user)))
    }
}

/// `DELETE /admin/:id`
pub struct DeleteUser {
    pub id: String,
}

#[async_trait]
impl Action for DeleteUser {
    fn name(&self) -> &'static str {
        "delete_user"
    }

    async fn run(&self, _ctx: &RequestContext, store: &StoreHandle) -> ActionResult {
        store
            .users()
            .delete(&self.id)
            .await?
            .ok_or_else(|| not_found(&self.id))?;
        info!(user = %self.id, "user deleted by admin");
        Ok(ResultEnvelope::ok(json!({})))
    }
}
