//! # Auth Module
//!
//! Password hashing, signed bearer tokens, the token cookie, reset-token
//! email delivery and the route guard.

pub mod cookie;
pub mod crypto;
pub mod email;
pub mod errors;
pub mod guard;
pub mod jwt;

pub use cookie::{CookieOptions, SetCookie, TOKEN_COOKIE};
pub use email::{create_email_sender, EmailConfig, EmailSender, EmailTemplate, MockEmailSender, SmtpEmailSender};
pub use errors::{AuthError, AuthResult};
pub use guard::{authenticate, authorize, bearer_token};
pub use jwt::{JwtClaims, JwtConfig, JwtManager};
