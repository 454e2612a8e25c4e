//! # HTTP Server Module
//!
//! Axum front end for the bootcamp API. Handlers extract and check the
//! request, build an action and hand it to the dispatcher; the resulting
//! envelope becomes the response.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/v1/bootcamps/*` - Bootcamps, radius search, photos
//! - `/api/v1/courses/*` - Courses
//! - `/api/v1/reviews/*` - Reviews
//! - `/api/v1/auth/*` - Authentication and account self-service
//! - `/api/v1/admin/*` - User management
//! - `/api/v1/general/*` - Seed import and wipe
//! - `/uploads/*` - Uploaded photos

pub mod admin_routes;
pub mod auth_routes;
pub mod bootcamp_routes;
pub mod config;
pub mod course_routes;
pub mod extract;
pub mod general_routes;
pub mod observability_routes;
pub mod response;
pub mod review_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use response::Rejection;
pub use server::{build_router, HttpServer};
pub use state::AppState;
