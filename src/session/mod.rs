//! Session Module
//!
//! Per-UI-session state: the nested store the cache lives in, the context that
//! carries it through every operation, and the host-side record of one UI session.

mod context;
mod store;
mod ui;

pub use context::SessionContext;
pub use store::{SessionStore, StoreNode};
pub use ui::UiSession;
