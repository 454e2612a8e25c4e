//! bootcamp-api - REST backend for a coding bootcamp directory
//!
//! Bootcamps, their courses and reviews, and the users who publish and
//! review them, served over HTTP from a primary store with an optional
//! offline replica.

pub mod auth;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod geo;
pub mod http_server;
pub mod models;
pub mod observability;
pub mod resources;
pub mod seed;
pub mod store;
