//! Connection Module
//!
//! Connection lifecycle wrapper, cursors, typed connect options and the
//! session builder adapter.

mod cursor;
mod options;
mod session_builder;
mod wrapper;

pub use cursor::{CachingCursor, Cursor, DEFAULT_CURSOR_TTL};
pub use options::{ConnectOptions, OptionSetter, RECOGNIZED_OPTIONS};
pub use session_builder::{Session, SessionBuilder, SessionInfo, SessionRegistry};
pub use wrapper::{CachedConnection, CONNECTION_DEFAULT_TTL};
