//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection parameters for one adapter instance.
///
/// Immutable once handed to [`JdbcAdapter`](crate::JdbcAdapter); dialects
/// only read it.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Adapter name (e.g. "derby", "jdbcderby", "jdbc").
    pub adapter: String,

    /// Explicit dialect identifier, overriding resolution from the adapter
    /// name, url and driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_spec: Option<String>,

    /// JDBC url (e.g. "jdbc:derby:memory:test;create=true").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Driver class name (e.g. "org.apache.derby.jdbc.EmbeddedDriver").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Database host, for network drivers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Database port, for network drivers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Schema used for introspection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Pool options, consumed by the external connection pool.
    #[serde(default)]
    pub pool: PoolConfig,
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("adapter", &self.adapter)
            .field("adapter_spec", &self.adapter_spec)
            .field("url", &self.url)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("schema", &self.schema)
            .field("pool", &self.pool)
            .finish()
    }
}

impl AdapterConfig {
    /// Configuration for the named adapter with everything else unset.
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_adapter_spec(mut self, spec: impl Into<String>) -> Self {
        self.adapter_spec = Some(spec.into());
        self
    }

    /// The JDBC sub-protocol of the url (`derby` for `jdbc:derby:...`).
    pub fn url_subprotocol(&self) -> Option<&str> {
        let rest = self.url.as_deref()?.strip_prefix("jdbc:")?;
        rest.split(':').next().filter(|s| !s.is_empty())
    }
}

/// Pool options. Pooling itself is handled outside this crate; the values
/// are validated and carried for the pool implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum connections (default: 5).
    #[serde(default = "default_pool_size")]
    pub size: usize,

    /// Seconds to wait for a free connection (default: 5).
    #[serde(default = "default_checkout_timeout")]
    pub checkout_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: default_pool_size(),
            checkout_timeout_secs: default_checkout_timeout(),
        }
    }
}

fn default_pool_size() -> usize {
    5
}

fn default_checkout_timeout() -> u64 {
    5
}
