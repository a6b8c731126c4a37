//! Login Module
//!
//! Connection providers, the login gate state machine, and the one-connection
//! singleton built on top of them.

mod gate;
mod provider;
mod singleton;

pub use gate::{GateState, GateView, LoginGate, CONNECT_ERROR_MESSAGE};
pub use provider::{ConnectionBackend, ConnectionProvider, FormField, LiveConnection, SessionBackend};
pub use singleton::ConnectionSingleton;
