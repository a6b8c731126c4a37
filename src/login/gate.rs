//! Login Gate
//!
//! Explicit state machine standing between a UI session and its connection.
//! The host renders whatever [`GateView`] the gate returns: a credentials form
//! until a connection is open, then "ready". Form values are staged in the
//! session store and consumed by the next submit.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::connection::ConnectOptions;
use crate::error::Result;
use crate::login::{ConnectionProvider, FormField, LiveConnection};
use crate::session::{SessionContext, StoreNode};

/// Warning shown with the form after a failed connect.
pub const CONNECT_ERROR_MESSAGE: &str = "Error connecting. Please try again.";

const FORM_TITLE: &str = "Database login";

// == Gate State ==
#[derive(Debug, Clone)]
pub enum GateState {
    NoConnection,
    AwaitingCredentials,
    Connected(LiveConnection),
    Error(String),
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::NoConnection => "no_connection",
            GateState::AwaitingCredentials => "awaiting_credentials",
            GateState::Connected(_) => "connected",
            GateState::Error(_) => "error",
        }
    }
}

// == Gate View ==
/// What the host should display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateView {
    Form {
        title: String,
        fields: Vec<FormField>,
        warning: Option<String>,
    },
    Ready {
        session_id: String,
    },
}

impl GateView {
    pub fn is_ready(&self) -> bool {
        matches!(self, GateView::Ready { .. })
    }
}

// == Login Gate ==
#[derive(Debug)]
pub struct LoginGate {
    provider: Arc<dyn ConnectionProvider>,
    state: GateState,
}

impl LoginGate {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            state: GateState::NoConnection,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.provider
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<&LiveConnection> {
        match &self.state {
            GateState::Connected(conn) if self.provider.is_open(conn) => Some(conn),
            _ => None,
        }
    }

    /// Store key a staged value of `field` lives under.
    pub fn form_key(&self, field: &str) -> String {
        format!("{}{}", self.form_prefix(), field)
    }

    fn form_prefix(&self) -> String {
        format!("{}_FORM", self.provider.key())
    }

    // == Render ==
    /// Returns the current view, discarding a connection that has gone stale.
    pub fn render(&mut self, ctx: &mut SessionContext) -> GateView {
        if let GateState::Connected(conn) = &self.state {
            if !self.provider.is_open(conn) {
                info!(session_id = %conn.session_id(), "cached connection closed, asking for credentials");
                ctx.results().clear_session(conn.session_id());
                conn.forget();
                self.state = GateState::AwaitingCredentials;
            }
        }

        if matches!(self.state, GateState::NoConnection) {
            self.state = GateState::AwaitingCredentials;
        }

        match &self.state {
            GateState::Connected(conn) => GateView::Ready {
                session_id: conn.session_id().to_string(),
            },
            GateState::Error(message) => self.form(Some(message.clone())),
            GateState::NoConnection | GateState::AwaitingCredentials => self.form(None),
        }
    }

    fn form(&self, warning: Option<String>) -> GateView {
        let defaults = self.provider.default_options();
        let fields = self
            .provider
            .default_form_fields()
            .into_iter()
            .map(|field| match prefilled(&defaults, &field) {
                Some(value) => field.with_default(value),
                None => field,
            })
            .collect();
        GateView::Form {
            title: FORM_TITLE.to_string(),
            fields,
            warning,
        }
    }

    // == Stage ==
    /// Records one form value for the next submit.
    pub fn stage(&self, ctx: &mut SessionContext, field: &str, value: &str) {
        let key = self.form_key(field);
        ctx.store_mut()
            .set(&[key.as_str()], StoreNode::Value(Value::String(value.to_string())));
    }

    // == Submit ==
    /// Connects with the staged values merged over the provider's defaults.
    ///
    /// Staged values are cleared whatever the outcome. A failed connect leaves
    /// the gate in the error state with the form re-shown.
    pub async fn submit(&mut self, ctx: &mut SessionContext) -> GateView {
        let staged = self.take_staged(ctx);
        if self.connection().is_some() {
            return self.render(ctx);
        }

        match self.connect(staged).await {
            Ok(conn) => {
                info!(session_id = %conn.session_id(), key = self.provider.key(), "login succeeded");
                self.state = GateState::Connected(conn);
            }
            Err(err) => {
                warn!(key = self.provider.key(), error = %err, "login failed");
                self.state = GateState::Error(CONNECT_ERROR_MESSAGE.to_string());
            }
        }
        self.render(ctx)
    }

    /// Stages every value of `values`, then submits.
    pub async fn submit_form<K, V, I>(&mut self, ctx: &mut SessionContext, values: I) -> GateView
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (field, value) in values {
            self.stage(ctx, field.as_ref(), value.as_ref());
        }
        self.submit(ctx).await
    }

    fn take_staged(&self, ctx: &mut SessionContext) -> BTreeMap<String, String> {
        let prefix = self.form_prefix();
        ctx.store_mut()
            .drain_prefixed(&prefix)
            .into_iter()
            .filter_map(|(key, node)| {
                let field = key.strip_prefix(&prefix)?.to_string();
                let value = node.as_value()?.as_str()?.to_string();
                Some((field, value))
            })
            .collect()
    }

    async fn connect(&self, staged: BTreeMap<String, String>) -> Result<LiveConnection> {
        let mut overrides = ConnectOptions::default();
        for (field, value) in staged.iter().filter(|(_, v)| !v.is_empty()) {
            overrides.set(field, value)?;
        }
        let options = self.provider.default_options().merged_with(&overrides);
        self.provider.connect(options).await
    }

    // == Disconnect ==
    /// Closes the open connection (dropping its cached results) and goes back
    /// to asking for credentials.
    pub async fn disconnect(&mut self, ctx: &mut SessionContext) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, GateState::AwaitingCredentials);
        match previous {
            GateState::Connected(conn) => self.provider.close(ctx, &conn).await,
            _ => Ok(()),
        }
    }
}

fn prefilled(defaults: &ConnectOptions, field: &FormField) -> Option<String> {
    if field.secret {
        return None;
    }
    match field.name.as_str() {
        "account" => defaults.account.clone(),
        "user" => defaults.user.clone(),
        "database" => defaults.database.clone(),
        "warehouse" => defaults.warehouse.clone(),
        "role" => defaults.role.clone(),
        _ => None,
    }
}
