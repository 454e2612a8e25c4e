//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bootcamp_api::auth::MockEmailSender;
use bootcamp_api::config::AppConfig;
use bootcamp_api::http_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mail: Arc<MockEmailSender>,
    pub upload_dir: tempfile::TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(mut config: AppConfig) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        config.server.upload_dir = upload_dir.path().to_path_buf();
        let mail = Arc::new(MockEmailSender::new());
        let state = Arc::new(AppState::new(&config).with_email_sender(mail.clone()));
        let router = build_router(&config.server, state.clone());
        Self {
            router,
            state,
            mail,
            upload_dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Reply { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Reply {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return its token
    pub async fn register(&self, name: &str, email: &str, role: &str) -> String {
        let reply = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({"name": name, "email": email, "password": "123456", "role": role}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "register failed: {}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_bootcamp(&self, token: &str, name: &str) -> String {
        let reply = self.post("/api/v1/bootcamps", Some(token), bootcamp_body(name)).await;
        assert_eq!(reply.status, StatusCode::CREATED, "create bootcamp failed: {}", reply.body);
        reply.body["data"]["_id"].as_str().unwrap().to_string()
    }
}

pub fn bootcamp_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Full stack web development",
        "website": "https://devworks.io",
        "email": "enroll@devworks.io",
        "address": "233 Bay State Rd Boston MA 02215",
        "careers": ["Web Development", "UI/UX"],
        "housing": true,
        "jobAssistance": true
    })
}

pub fn course_body(title: &str, tuition: f64) -> Value {
    json!({
        "title": title,
        "description": "Learn the stack",
        "weeks": 8,
        "tuition": tuition,
        "minimumSkill": "beginner"
    })
}
