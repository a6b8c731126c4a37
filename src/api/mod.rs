//! API Module
//!
//! HTTP host for UI sessions: login gate, cached query execution and stats.
//!
//! # Endpoints
//! - `POST /sessions`, `DELETE /sessions/:id`
//! - `GET|POST /sessions/:id/login`, `POST /sessions/:id/disconnect`
//! - `POST /sessions/:id/query`, `GET /sessions/:id/stats`
//! - `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
