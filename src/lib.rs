//! Session Cache - per-UI-session query result caching and connection lifecycle
//!
//! Memoizes remote query results inside each UI session's store with a TTL,
//! invalidates them when their connection closes, and gates UI sessions behind
//! a login flow until a connection is open.

pub mod api;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod login;
pub mod models;
pub mod session;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use connection::{CachedConnection, Cursor, Session, SessionBuilder};
pub use error::{Result, SessionCacheError};
pub use login::{ConnectionSingleton, LoginGate};
pub use session::SessionContext;
pub use tasks::spawn_session_reaper;
