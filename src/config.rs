//! # Configuration
//!
//! Connection settings for a remote object service plus the options the
//! mapping layer itself needs. Host applications usually deserialize a
//! [`ServiceConfig`] from their own config file or call
//! [`ServiceConfig::from_env`].

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Prefix of the environment variables read by [`ServiceConfig::from_env`].
pub const ENV_PREFIX: &str = "REMOTE_MODEL_";

/// Default transaction timeout, in seconds.
pub const DEFAULT_TRANSACTION_TIMEOUT: u32 = 60;

/// Default limit for finds that load fields.
pub const DEFAULT_FIELD_LIMIT: usize = 1000;

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Host name or address, optionally with a port (`erp.example.com:8443`).
    pub host: String,
    pub login: String,
    pub password: String,
    /// `https` or `http`.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout: u32,
    #[serde(default = "default_field_limit")]
    pub field_limit: usize,
    /// Types whose primary key field cannot be guessed, by type name.
    #[serde(default)]
    pub key_fields: HashMap<String, String>,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_transaction_timeout() -> u32 {
    DEFAULT_TRANSACTION_TIMEOUT
}

fn default_field_limit() -> usize {
    DEFAULT_FIELD_LIMIT
}

impl ServiceConfig {
    pub fn new(host: impl Into<String>, login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            login: login.into(),
            password: password.into(),
            scheme: default_scheme(),
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            field_limit: DEFAULT_FIELD_LIMIT,
            key_fields: HashMap::new(),
        }
    }

    /// Read `REMOTE_MODEL_HOST`, `REMOTE_MODEL_LOGIN`, `REMOTE_MODEL_PASSWORD`
    /// and the optional `REMOTE_MODEL_SCHEME`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));
        let required = |suffix: &str| {
            var(suffix).ok_or_else(|| Error::Config(format!("{ENV_PREFIX}{suffix} is not set")))
        };

        let mut config = Self::new(required("HOST")?, required("LOGIN")?, required("PASSWORD")?);
        if let Some(scheme) = var("SCHEME") {
            config.scheme = scheme;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        match self.scheme.as_str() {
            "https" | "http" => Ok(()),
            other => Err(Error::Config(format!("unsupported scheme '{other}'"))),
        }
    }

    pub fn with_key_field(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.key_fields.insert(type_name.into(), field.into());
        self
    }

    /// Base URL of the service endpoints.
    pub fn services_url(&self) -> String {
        format!("{}://{}/rpc/services/", self.scheme, self.host)
    }

    /// Description URL of one service endpoint.
    pub fn endpoint(&self, service: &str) -> String {
        format!("{}{service}?wsdl", self.services_url())
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("transaction_timeout", &self.transaction_timeout)
            .field("field_limit", &self.field_limit)
            .field("key_fields", &self.key_fields)
            .finish()
    }
}
