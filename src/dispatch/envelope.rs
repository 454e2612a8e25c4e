//! # Result Envelopes
//!
//! Every action produces a [`ResultEnvelope`]. Call sites build envelopes
//! with named constructors and choose the [`EnvelopeShape`] (the key set
//! emitted on the wire) per operation. Serialization flattens the envelope
//! into positional values for its shape and zips them with the shape's
//! keys through [`build`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::error;

use super::errors::ActionError;
use crate::auth::cookie::SetCookie;

/// Whether the operation itself succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    /// Failure if either side failed
    pub fn combine(self, other: Outcome) -> Outcome {
        if self.is_success() && other.is_success() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure => f.write_str("failure"),
        }
    }
}

/// A page descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: usize,
    pub limit: usize,
}

/// Neighbouring pages of a paginated listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRef>,
}

impl Pagination {
    /// `next` iff `page * limit < total`, `previous` iff `page > 1`
    pub fn compute(page: usize, limit: usize, total: usize) -> Self {
        Self {
            next: (page.saturating_mul(limit) < total).then(|| PageRef {
                page: page + 1,
                limit,
            }),
            previous: (page > 1).then(|| PageRef {
                page: page - 1,
                limit,
            }),
        }
    }
}

/// Envelope payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Resource(Value),
    Resources(Vec<Value>),
    Message(String),
    Empty,
}

impl Payload {
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Resource(value) => value.clone(),
            Payload::Resources(values) => Value::Array(values.clone()),
            Payload::Message(message) => Value::String(message.clone()),
            Payload::Empty => json!({}),
        }
    }
}

/// Key set emitted for an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    Plain,
    WithCount,
    WithCountAndPagination,
    WithToken,
}

impl EnvelopeShape {
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            EnvelopeShape::Plain => &["success", "status", "data"],
            EnvelopeShape::WithCount => &["success", "status", "count", "data"],
            EnvelopeShape::WithCountAndPagination => {
                &["success", "status", "count", "pagination", "data"]
            }
            EnvelopeShape::WithToken => &["success", "status", "token_name", "token", "options"],
        }
    }
}

/// Zip positional `params` with the keys of `shape`.
///
/// Returns `None` (and logs) when the lengths differ: the call site and
/// its declared shape disagree.
pub fn build(params: Vec<Value>, shape: EnvelopeShape) -> Option<Map<String, Value>> {
    let keys = shape.keys();
    if params.len() != keys.len() {
        error!(
            ?shape,
            expected = keys.len(),
            got = params.len(),
            "envelope params do not match shape keys"
        );
        return None;
    }

    Some(
        keys.iter()
            .map(|key| key.to_string())
            .zip(params)
            .collect(),
    )
}

/// Normalized result of one action
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub outcome: Outcome,
    pub status: u16,
    pub shape: EnvelopeShape,
    pub count: Option<usize>,
    pub pagination: Option<Pagination>,
    /// Cookie to set; for `WithToken` it also carries the token
    pub cookie: Option<SetCookie>,
    pub payload: Payload,
}

impl ResultEnvelope {
    fn plain(outcome: Outcome, status: u16, payload: Payload) -> Self {
        Self {
            outcome,
            status,
            shape: EnvelopeShape::Plain,
            count: None,
            pagination: None,
            cookie: None,
            payload,
        }
    }

    /// 200 with a single resource
    pub fn ok(data: Value) -> Self {
        Self::plain(Outcome::Success, 200, Payload::Resource(data))
    }

    /// 201 with the created resource
    pub fn created(data: Value) -> Self {
        Self::plain(Outcome::Success, 201, Payload::Resource(data))
    }

    /// 200 with a list and its length
    pub fn listing(items: Vec<Value>) -> Self {
        Self {
            shape: EnvelopeShape::WithCount,
            count: Some(items.len()),
            ..Self::plain(Outcome::Success, 200, Payload::Resources(items))
        }
    }

    /// 200 with one page of a list
    pub fn paginated(items: Vec<Value>, pagination: Pagination) -> Self {
        Self {
            shape: EnvelopeShape::WithCountAndPagination,
            count: Some(items.len()),
            pagination: Some(pagination),
            ..Self::plain(Outcome::Success, 200, Payload::Resources(items))
        }
    }

    /// Token response; the cookie value is the token
    pub fn token(status: u16, cookie: SetCookie) -> Self {
        Self {
            shape: EnvelopeShape::WithToken,
            cookie: Some(cookie),
            ..Self::plain(Outcome::Success, status, Payload::Empty)
        }
    }

    /// Text payload
    pub fn message(outcome: Outcome, status: u16, message: impl Into<String>) -> Self {
        Self::plain(outcome, status, Payload::Message(message.into()))
    }

    /// 500 failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self::message(Outcome::Failure, 500, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_cookie(mut self, cookie: SetCookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Positional values for this envelope's shape
    pub fn params(&self) -> Vec<Value> {
        let mut params = vec![json!(self.is_success()), json!(self.status)];
        match self.shape {
            EnvelopeShape::Plain => {}
            EnvelopeShape::WithCount => {
                params.extend(self.count.map(|c| json!(c)));
            }
            EnvelopeShape::WithCountAndPagination => {
                params.extend(self.count.map(|c| json!(c)));
                params.extend(
                    self.pagination
                        .as_ref()
                        .and_then(|p| serde_json::to_value(p).ok()),
                );
            }
            EnvelopeShape::WithToken => {
                if let Some(cookie) = &self.cookie {
                    params.push(json!(cookie.name));
                    params.push(json!(cookie.value));
                    params.extend(serde_json::to_value(&cookie.options).ok());
                }
                return params;
            }
        }
        params.push(self.payload.to_value());
        params
    }

    /// Response body: the built envelope minus transport-only keys
    /// (`status`, `token_name`, `options`).
    pub fn body(&self) -> Option<Map<String, Value>> {
        let mut body = build(self.params(), self.shape)?;
        for key in ["status", "token_name", "options"] {
            body.remove(key);
        }
        Some(body)
    }
}

impl From<ActionError> for ResultEnvelope {
    fn from(err: ActionError) -> Self {
        ResultEnvelope::message(err.outcome(), err.status_code(), err.to_string())
    }
}
