//! Token cookie handling.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Name of the cookie carrying the bearer token
pub const TOKEN_COOKIE: &str = "token";

/// Attributes of an issued cookie
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieOptions {
    pub expires: DateTime<Utc>,
    pub http_only: bool,
    pub secure: bool,
}

impl CookieOptions {
    /// Options for a token cookie valid for `days`
    pub fn for_days(days: i64, secure: bool) -> Self {
        Self {
            expires: Utc::now() + Duration::days(days),
            http_only: true,
            secure,
        }
    }

    /// Options that expire a cookie shortly (logout)
    pub fn expiring(seconds: i64) -> Self {
        Self {
            expires: Utc::now() + Duration::seconds(seconds),
            http_only: true,
            secure: false,
        }
    }
}

/// A cookie to set on the response
#[derive(Debug, Clone, PartialEq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Path=/; Expires={}",
            self.name,
            self.value,
            self.options.expires.format("%a, %d %b %Y %H:%M:%S GMT")
        );
        if self.options.http_only {
            header.push_str("; HttpOnly");
        }
        if self.options.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Find a cookie value in a `Cookie` request header
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
