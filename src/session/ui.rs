//! UI Session
//!
//! Host-side record of one UI session: its context, its login gate, and when it
//! was last used.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::login::{ConnectionProvider, LoginGate};
use crate::session::SessionContext;

#[derive(Debug)]
pub struct UiSession {
    pub ctx: SessionContext,
    pub gate: LoginGate,
    last_seen: DateTime<Utc>,
}

impl UiSession {
    pub fn new(provider: Arc<dyn ConnectionProvider>, clock: Arc<dyn Clock>) -> Self {
        let ctx = SessionContext::with_clock(clock);
        let last_seen = ctx.now();
        Self {
            ctx,
            gate: LoginGate::new(provider),
            last_seen,
        }
    }

    pub fn id(&self) -> Uuid {
        self.ctx.id()
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Marks the session as used now.
    pub fn touch(&mut self) {
        self.last_seen = self.ctx.now();
    }

    /// Seconds since the session was last used.
    pub fn idle_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_seen).num_seconds()
    }

    /// Disconnects the gate's connection, if any.
    pub async fn close_all(&mut self) {
        if let Err(err) = self.gate.disconnect(&mut self.ctx).await {
            warn!(ui_session = %self.id(), error = %err, "closing connection failed");
        }
    }
}
