//! Connection Singleton
//!
//! Keeps at most one open connection per provider and hands out clones of it,
//! reconnecting once the held connection reports closed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::connection::ConnectOptions;
use crate::error::Result;
use crate::login::{ConnectionProvider, LiveConnection};
use crate::session::SessionContext;

#[derive(Debug)]
pub struct ConnectionSingleton {
    provider: Arc<dyn ConnectionProvider>,
    slot: Mutex<Option<LiveConnection>>,
}

impl ConnectionSingleton {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            slot: Mutex::new(None),
        }
    }

    /// Name of the slot the connection is held under.
    pub fn key(&self) -> &'static str {
        self.provider.key()
    }

    /// Returns the held connection, opening a new one with `options` merged
    /// over the provider's defaults when there is none or it went stale.
    pub async fn get(&self, options: &ConnectOptions) -> Result<LiveConnection> {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.as_ref() {
            if self.provider.is_open(conn) {
                return Ok(conn.clone());
            }
            info!(key = self.key(), session_id = %conn.session_id(), "held connection closed, reconnecting");
            conn.forget();
        }

        let merged = self.provider.default_options().merged_with(options);
        let conn = self.provider.connect(merged).await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    pub async fn is_held(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|conn| self.provider.is_open(conn))
    }

    /// Closes and forgets the held connection.
    pub async fn close(&self, ctx: &mut SessionContext) -> Result<()> {
        let held = self.slot.lock().await.take();
        match held {
            Some(conn) => self.provider.close(ctx, &conn).await,
            None => Ok(()),
        }
    }
}
