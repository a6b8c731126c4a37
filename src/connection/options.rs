//! Connection Options
//!
//! Strongly typed connect parameters. Recognised keys map to fields; anything
//! else lands in `extra` and is forwarded to the remote client untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::TTL_OPTION;
use crate::error::{Result, SessionCacheError};

/// Parses one option value into its field.
pub type OptionSetter = fn(&mut ConnectOptions, String) -> Result<()>;

/// Keys with a dedicated field, each with the setter that fills it.
pub const RECOGNIZED_OPTIONS: &[(&str, OptionSetter)] = &[
    ("account", |o, v| set_text(&mut o.account, v)),
    ("user", |o, v| set_text(&mut o.user, v)),
    ("password", |o, v| set_text(&mut o.password, v)),
    ("host", |o, v| set_text(&mut o.host, v)),
    ("port", |o, v| {
        o.port = Some(parse_number("port", &v)?);
        Ok(())
    }),
    ("database", |o, v| set_text(&mut o.database, v)),
    ("schema", |o, v| set_text(&mut o.schema, v)),
    ("warehouse", |o, v| set_text(&mut o.warehouse, v)),
    ("role", |o, v| set_text(&mut o.role, v)),
    ("application", |o, v| set_text(&mut o.application, v)),
    (TTL_OPTION, |o, v| {
        o.ttl = Some(parse_number(TTL_OPTION, &v)?);
        Ok(())
    }),
];

fn set_text(field: &mut Option<String>, value: String) -> Result<()> {
    *field = Some(value);
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SessionCacheError::InvalidRequest(format!("invalid {name}: {value}")))
}

// == Connect Options ==
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Default cache TTL in seconds for cursors of this connection.
    /// Consumed by the connection wrapper, never sent to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Provider-specific options.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ConnectOptions {
    /// Builds options from loosely typed key/value pairs.
    ///
    /// Keys are matched case-insensitively.
    pub fn from_params<K, V, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in params {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Sets one option by name.
    ///
    /// Recognized keys are parsed into their field; any other key is kept
    /// verbatim in `extra`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(SessionCacheError::InvalidRequest(
                "option name cannot be empty".to_string(),
            ));
        }

        match RECOGNIZED_OPTIONS.iter().find(|(name, _)| *name == key) {
            Some((_, setter)) => setter(self, value.to_string()),
            None => {
                self.extra.insert(key, value.to_string());
                Ok(())
            }
        }
    }

    /// Removes and returns the TTL option.
    pub fn take_ttl(&mut self) -> Option<i64> {
        self.ttl.take()
    }

    /// Drops the password so stored copies of these options hold no secret.
    pub fn redact_password(&mut self) {
        self.password = None;
    }

    /// Returns `self` with every option set in `overrides` replacing ours.
    pub fn merged_with(&self, overrides: &ConnectOptions) -> ConnectOptions {
        let mut merged = self.clone();
        macro_rules! take {
            ($($field:ident),*) => {
                $(if overrides.$field.is_some() {
                    merged.$field = overrides.$field.clone();
                })*
            };
        }
        take!(account, user, password, host, port, database, schema, warehouse, role, application, ttl);
        merged
            .extra
            .extend(overrides.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Names of all options that are set, for logging.
    pub fn keys(&self) -> Vec<&str> {
        let named = [
            ("account", self.account.is_some()),
            ("user", self.user.is_some()),
            ("password", self.password.is_some()),
            ("host", self.host.is_some()),
            ("port", self.port.is_some()),
            ("database", self.database.is_some()),
            ("schema", self.schema.is_some()),
            ("warehouse", self.warehouse.is_some()),
            ("role", self.role.is_some()),
            ("application", self.application.is_some()),
            (TTL_OPTION, self.ttl.is_some()),
        ];
        named
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name)
            .chain(self.extra.keys().map(String::as_str))
            .collect()
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("application", &self.application)
            .field("ttl", &self.ttl)
            .field("extra", &self.extra)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params_maps_recognized_keys() {
        let options = ConnectOptions::from_params([
            ("Account", "acme"),
            ("USER", "alice"),
            ("password", "secret"),
            ("port", "443"),
            ("ttl", "60"),
            ("login_timeout", "30"),
        ])
        .unwrap();

        assert_eq!(options.account.as_deref(), Some("acme"));
        assert_eq!(options.user.as_deref(), Some("alice"));
        assert_eq!(options.port, Some(443));
        assert_eq!(options.ttl, Some(60));
        assert_eq!(options.extra.get("login_timeout").map(String::as_str), Some("30"));
    }

    #[test]
    fn test_recognized_keys_never_land_in_extra() {
        let mut options = ConnectOptions::default();
        for (name, _) in RECOGNIZED_OPTIONS {
            let value = if matches!(*name, "port" | "ttl") { "1" } else { "x" };
            options.set(&name.to_uppercase(), value).unwrap();
        }

        assert!(options.extra.is_empty());
        assert_eq!(options.warehouse.as_deref(), Some("x"));
        assert_eq!(options.port, Some(1));
    }

    #[test]
    fn test_empty_option_name_is_rejected() {
        let mut options = ConnectOptions::default();
        assert!(options.set("  ", "x").is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = ConnectOptions::from_params([("port", "https")]);
        assert!(matches!(result, Err(SessionCacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_take_ttl_clears_field() {
        let mut options = ConnectOptions::from_params([("ttl", "30")]).unwrap();

        assert_eq!(options.take_ttl(), Some(30));
        assert_eq!(options.ttl, None);
        assert!(!options.keys().contains(&TTL_OPTION));
    }

    #[test]
    fn test_debug_masks_password() {
        let options = ConnectOptions::from_params([("password", "hunter2")]).unwrap();
        let debug = format!("{options:?}");

        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_serialize_skips_password() {
        let options =
            ConnectOptions::from_params([("user", "alice"), ("password", "hunter2")]).unwrap();
        let json = serde_json::to_string(&options).unwrap();

        assert!(json.contains("alice"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_merged_with_prefers_overrides() {
        let base = ConnectOptions::from_params([("user", "alice"), ("ttl", "3600")]).unwrap();
        let overrides = ConnectOptions::from_params([("user", "bob"), ("role", "ANALYST")]).unwrap();

        let merged = base.merged_with(&overrides);

        assert_eq!(merged.user.as_deref(), Some("bob"));
        assert_eq!(merged.role.as_deref(), Some("ANALYST"));
        assert_eq!(merged.ttl, Some(3600));
    }

    #[test]
    fn test_redact_password() {
        let mut options = ConnectOptions::from_params([("password", "secret")]).unwrap();
        options.redact_password();
        assert!(options.password.is_none());
    }
}
