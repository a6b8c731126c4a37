//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Session reaper: retires UI sessions idle past the configured timeout

mod cleanup;

pub use cleanup::{reap_idle_sessions, spawn_session_reaper};
