//! Dialect registry for explicit dependency injection.
//!
//! The [`DialectRegistry`] maps adapter identifiers to dialect strategies and
//! connection factories. It is explicitly constructed and passed to
//! [`JdbcAdapter::new`](crate::JdbcAdapter::new) rather than living in global
//! state, so tests can register fakes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};

use super::traits::{Connection, Dialect};

/// Identifier of the generic fallback dialect.
pub const GENERIC_DIALECT: &str = "jdbc";

/// Builds a live connection from configuration.
pub type ConnectionFactory =
    Arc<dyn Fn(&AdapterConfig) -> Result<Box<dyn Connection>> + Send + Sync>;

/// Inputs that determine which dialect a configuration resolves to.
type ResolveKey = (Option<String>, String, Option<String>, Option<String>);

/// Registry of dialects and connection factories.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = DialectRegistry::with_builtins();
/// registry.register_connector("derby", |config| Ok(Box::new(MyDerbyConnection::open(config)?)));
///
/// let adapter = JdbcAdapter::new(None, config, &registry)?;
/// ```
#[derive(Default)]
pub struct DialectRegistry {
    /// Registered dialects by identifier.
    dialects: HashMap<String, Arc<dyn Dialect>>,

    /// Connection factories keyed by dialect name.
    connectors: HashMap<String, ConnectionFactory>,

    /// Resolution results, keyed by the configuration inputs.
    resolved: RwLock<HashMap<ResolveKey, Arc<dyn Dialect>>>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dialects = self.dialect_names();
        dialects.sort_unstable();
        let mut connectors: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        connectors.sort_unstable();

        f.debug_struct("DialectRegistry")
            .field("dialects", &dialects)
            .field("connectors", &connectors)
            .finish()
    }
}

impl DialectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in dialects registered.
    ///
    /// `derby` and `jdbcderby` map to Derby, `jdbc` to the generic dialect.
    /// No connection factories are registered.
    pub fn with_builtins() -> Self {
        use crate::drivers::{DerbyDialect, GenericDialect};

        let mut registry = Self::new();

        let derby: Arc<dyn Dialect> = Arc::new(DerbyDialect::new());
        registry.register_dialect_arc("derby", derby.clone());
        registry.register_dialect_arc("jdbcderby", derby);
        registry.register_dialect(GENERIC_DIALECT, GenericDialect::new());

        registry
    }

    /// Register a dialect under an identifier.
    pub fn register_dialect(&mut self, name: impl Into<String>, dialect: impl Dialect + 'static) {
        self.register_dialect_arc(name, Arc::new(dialect));
    }

    /// Register a dialect as an Arc (for sharing between identifiers).
    pub fn register_dialect_arc(&mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(name.into().to_lowercase(), dialect);
        self.clear_resolved();
    }

    /// Register the connection factory for a dialect name.
    pub fn register_connector<F>(&mut self, dialect: impl Into<String>, factory: F)
    where
        F: Fn(&AdapterConfig) -> Result<Box<dyn Connection>> + Send + Sync + 'static,
    {
        self.connectors
            .insert(dialect.into().to_lowercase(), Arc::new(factory));
    }

    /// Get a dialect by identifier.
    pub fn get_dialect(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(&name.to_lowercase()).cloned()
    }

    /// Get a dialect by identifier, returning an error if not found.
    pub fn require_dialect(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.get_dialect(name)
            .ok_or_else(|| AdapterError::Config(format!("Unknown adapter dialect: {}", name)))
    }

    /// Check if a dialect is registered.
    pub fn has_dialect(&self, name: &str) -> bool {
        self.dialects.contains_key(&name.to_lowercase())
    }

    /// Get all registered dialect identifiers.
    pub fn dialect_names(&self) -> Vec<&str> {
        self.dialects.keys().map(String::as_str).collect()
    }

    /// Resolve the dialect for a configuration.
    ///
    /// Order: explicit `adapter_spec`, the adapter name (unless it is the
    /// generic `jdbc`), the url sub-protocol, a registered identifier found
    /// in the driver class name, then the generic dialect. An explicit
    /// `adapter_spec` that is not registered is an error.
    ///
    /// Results are memoized per distinct set of inputs; `config` is never
    /// modified.
    pub fn resolve(&self, config: &AdapterConfig) -> Result<Arc<dyn Dialect>> {
        let key: ResolveKey = (
            config.adapter_spec.clone(),
            config.adapter.to_lowercase(),
            config.url_subprotocol().map(str::to_lowercase),
            config.driver.clone(),
        );

        if let Ok(cache) = self.resolved.read() {
            if let Some(dialect) = cache.get(&key) {
                return Ok(dialect.clone());
            }
        }

        let dialect = self.resolve_uncached(config)?;
        debug!(
            "Resolved adapter '{}' to dialect {}",
            config.adapter,
            dialect.name()
        );

        if let Ok(mut cache) = self.resolved.write() {
            cache.insert(key, dialect.clone());
        }
        Ok(dialect)
    }

    fn resolve_uncached(&self, config: &AdapterConfig) -> Result<Arc<dyn Dialect>> {
        if let Some(spec) = &config.adapter_spec {
            return self.require_dialect(spec);
        }

        if !config.adapter.eq_ignore_ascii_case(GENERIC_DIALECT) {
            if let Some(dialect) = self.get_dialect(&config.adapter) {
                return Ok(dialect);
            }
        }

        if let Some(dialect) = config.url_subprotocol().and_then(|s| self.get_dialect(s)) {
            return Ok(dialect);
        }

        if let Some(driver) = &config.driver {
            let driver = driver.to_lowercase();
            let mut names: Vec<&str> = self
                .dialect_names()
                .into_iter()
                .filter(|n| *n != GENERIC_DIALECT)
                .collect();
            // Longest identifier first so "jdbcderby" beats "derby" deterministically.
            names.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            if let Some(name) = names.into_iter().find(|n| driver.contains(*n)) {
                return self.require_dialect(name);
            }
        }

        self.require_dialect(GENERIC_DIALECT)
    }

    /// Drop memoized resolutions.
    fn clear_resolved(&mut self) {
        if let Ok(cache) = self.resolved.get_mut() {
            cache.clear();
        }
    }

    /// Open a connection with the factory registered for `dialect`.
    pub fn connect(&self, dialect: &str, config: &AdapterConfig) -> Result<Box<dyn Connection>> {
        let factory = self.connectors.get(&dialect.to_lowercase()).ok_or_else(|| {
            AdapterError::Config(format!(
                "No connection factory registered for dialect '{}'",
                dialect
            ))
        })?;
        factory(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DerbyDialect, GenericDialect};
    use crate::test_support::FakeConnection;

    #[test]
    fn test_builtins_registered() {
        let registry = DialectRegistry::with_builtins();
        assert!(registry.has_dialect("derby"));
        assert!(registry.has_dialect("jdbcderby"));
        assert!(registry.has_dialect("JDBC"));
        assert_eq!(registry.require_dialect("jdbcderby").unwrap().name(), "derby");
        assert!(registry.require_dialect("oracle").is_err());
    }

    #[test]
    fn test_resolve_by_adapter_name() {
        let registry = DialectRegistry::with_builtins();
        let dialect = registry.resolve(&AdapterConfig::new("derby")).unwrap();
        assert_eq!(dialect.adapter_name(), "Derby");
    }

    #[test]
    fn test_resolve_explicit_spec_wins() {
        let registry = DialectRegistry::with_builtins();
        let config = AdapterConfig::new("derby").with_adapter_spec("jdbc");
        assert_eq!(registry.resolve(&config).unwrap().name(), "jdbc");

        let unknown = AdapterConfig::new("derby").with_adapter_spec("nope");
        assert!(registry.resolve(&unknown).is_err());
    }

    #[test]
    fn test_resolve_by_url_then_driver() {
        let registry = DialectRegistry::with_builtins();

        let by_url = AdapterConfig::new("jdbc").with_url("jdbc:derby:memory:test");
        assert_eq!(registry.resolve(&by_url).unwrap().name(), "derby");

        let by_driver = AdapterConfig::new("jdbc")
            .with_url("jdbc:unknown://host/db")
            .with_driver("org.apache.derby.jdbc.ClientDriver");
        assert_eq!(registry.resolve(&by_driver).unwrap().name(), "derby");

        let generic = AdapterConfig::new("jdbc").with_url("jdbc:hsqldb:mem:x");
        assert_eq!(registry.resolve(&generic).unwrap().name(), "jdbc");
    }

    #[test]
    fn test_resolve_is_memoized_without_touching_config() {
        let registry = DialectRegistry::with_builtins();
        let config = AdapterConfig::new("jdbc").with_url("jdbc:derby:memory:test");
        let before = config.clone();

        let first = registry.resolve(&config).unwrap();
        let second = registry.resolve(&config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(config, before);
        assert!(config.adapter_spec.is_none());
    }

    #[test]
    fn test_register_clears_memo() {
        let mut registry = DialectRegistry::new();
        registry.register_dialect("jdbc", GenericDialect::new());
        let config = AdapterConfig::new("custom");
        assert_eq!(registry.resolve(&config).unwrap().name(), "jdbc");

        registry.register_dialect("custom", DerbyDialect::new());
        assert_eq!(registry.resolve(&config).unwrap().name(), "derby");
    }

    #[test]
    fn test_connect_uses_registered_factory() {
        let mut registry = DialectRegistry::with_builtins();
        let config = AdapterConfig::new("derby");
        assert!(matches!(
            registry.connect("derby", &config),
            Err(AdapterError::Config(_))
        ));

        registry.register_connector("derby", |_| Ok(Box::new(FakeConnection::new())));
        assert!(registry.connect("derby", &config).is_ok());
    }
}
