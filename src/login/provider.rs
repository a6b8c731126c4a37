//! Connection Providers
//!
//! The capability interface the login gate and singleton drive: open a
//! connection, check it is still open, close it. One implementation per kind of
//! handle the host wants (raw connections or logical sessions).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::client::{Query, RemoteClient, ResultHandle};
use crate::connection::{CachedConnection, ConnectOptions, Session, SessionBuilder, SessionRegistry};
use crate::error::Result;
use crate::session::SessionContext;

// == Form Field ==
/// One credential input shown by the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    /// Pre-filled value
    pub default: String,
    /// Rendered as a password input
    pub secret: bool,
}

impl FormField {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: String::new(),
            secret: false,
        }
    }

    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::text(name)
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = value.into();
        self
    }

    /// Capitalized label, e.g. `Account` for `account`.
    pub fn label(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// == Live Connection ==
/// Handle a provider hands back.
#[derive(Debug, Clone)]
pub enum LiveConnection {
    Connection(CachedConnection),
    Session(Session),
}

impl LiveConnection {
    pub fn connection(&self) -> &CachedConnection {
        match self {
            LiveConnection::Connection(connection) => connection,
            LiveConnection::Session(session) => session.connection(),
        }
    }

    pub fn session_id(&self) -> &str {
        self.connection().session_id()
    }

    pub fn is_open(&self) -> bool {
        self.connection().is_open()
    }

    /// Runs `query` on a new cursor of a connection, or on a session's own cursor.
    pub async fn execute(
        &self,
        ctx: &mut SessionContext,
        query: Query,
        ttl: Option<i64>,
    ) -> Result<ResultHandle> {
        match self {
            LiveConnection::Connection(connection) => {
                connection.cursor(None).execute(ctx, query, ttl).await
            }
            LiveConnection::Session(session) => session.sql(ctx, query, ttl).await,
        }
    }

    /// Releases host-side bookkeeping of a handle whose server end is gone.
    pub fn forget(&self) {
        if let LiveConnection::Session(session) = self {
            session.forget();
        }
    }

    pub async fn close(&self, ctx: &mut SessionContext) -> Result<()> {
        match self {
            LiveConnection::Connection(connection) => connection.close(ctx).await,
            LiveConnection::Session(session) => session.close(ctx).await,
        }
    }
}

// == Connection Provider ==
#[async_trait]
pub trait ConnectionProvider: Send + Sync + fmt::Debug {
    /// Stable name of the slot an open connection of this provider is kept in.
    fn key(&self) -> &'static str;

    fn default_form_fields(&self) -> Vec<FormField> {
        vec![
            FormField::text("account"),
            FormField::text("user"),
            FormField::secret("password"),
        ]
    }

    fn default_options(&self) -> ConnectOptions {
        ConnectOptions::default()
    }

    fn is_open(&self, conn: &LiveConnection) -> bool {
        conn.is_open()
    }

    async fn connect(&self, options: ConnectOptions) -> Result<LiveConnection>;

    async fn close(&self, ctx: &mut SessionContext, conn: &LiveConnection) -> Result<()> {
        conn.close(ctx).await
    }
}

// == Connection Backend ==
/// Provider handing out cached connections.
#[derive(Debug, Clone)]
pub struct ConnectionBackend {
    client: Arc<dyn RemoteClient>,
    defaults: ConnectOptions,
}

impl ConnectionBackend {
    pub const KEY: &'static str = "ST_SNOW_CONN";

    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client,
            defaults: ConnectOptions::default(),
        }
    }

    /// Options merged under whatever the login form collects.
    pub fn with_defaults(mut self, defaults: ConnectOptions) -> Self {
        self.defaults = defaults;
        self
    }
}

#[async_trait]
impl ConnectionProvider for ConnectionBackend {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn default_options(&self) -> ConnectOptions {
        self.defaults.clone()
    }

    async fn connect(&self, options: ConnectOptions) -> Result<LiveConnection> {
        let connection = CachedConnection::connect(self.client.as_ref(), options).await?;
        Ok(LiveConnection::Connection(connection))
    }
}

// == Session Backend ==
/// Provider handing out logical sessions built through [`SessionBuilder`].
#[derive(Debug, Clone)]
pub struct SessionBackend {
    client: Arc<dyn RemoteClient>,
    registry: SessionRegistry,
    defaults: ConnectOptions,
}

impl SessionBackend {
    pub const KEY: &'static str = "ST_SNOW_SESS";

    /// Registers sessions in the process-wide registry.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self::with_registry(client, SessionRegistry::global().clone())
    }

    pub fn with_registry(client: Arc<dyn RemoteClient>, registry: SessionRegistry) -> Self {
        Self {
            client,
            registry,
            defaults: ConnectOptions::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ConnectOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

#[async_trait]
impl ConnectionProvider for SessionBackend {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn default_options(&self) -> ConnectOptions {
        self.defaults.clone()
    }

    async fn connect(&self, options: ConnectOptions) -> Result<LiveConnection> {
        let session = SessionBuilder::new()
            .options(&options)
            .create(self.client.as_ref(), &self.registry)
            .await?;
        Ok(LiveConnection::Session(session))
    }
}
