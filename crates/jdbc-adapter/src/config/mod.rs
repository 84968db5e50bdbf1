//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl AdapterConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AdapterConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_yaml_defaults() {
        let config = AdapterConfig::from_yaml(
            r#"
adapter: derby
url: "jdbc:derby:memory:test;create=true"
username: app
"#,
        )
        .unwrap();

        assert_eq!(config.adapter, "derby");
        assert_eq!(config.username.as_deref(), Some("app"));
        assert!(config.schema.is_none());
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.url_subprotocol(), Some("derby"));
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        let result = AdapterConfig::from_yaml("adapter: \"\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "adapter: jdbc\nurl: \"jdbc:derby://db:1527/shop\"\nschema: SALES\npool:\n  size: 10"
        )
        .unwrap();

        let config = AdapterConfig::load(file.path()).unwrap();
        assert_eq!(config.schema.as_deref(), Some("SALES"));
        assert_eq!(config.pool.size, 10);
        assert_eq!(config.pool.checkout_timeout_secs, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AdapterConfig::load("/nonexistent/adapter.yaml");
        assert!(matches!(result, Err(crate::error::AdapterError::Io(_))));
    }

    #[test]
    fn test_url_subprotocol() {
        assert_eq!(
            AdapterConfig::new("jdbc").with_url("jdbc:derby://h/db").url_subprotocol(),
            Some("derby")
        );
        assert_eq!(
            AdapterConfig::new("jdbc").with_url("derby:x").url_subprotocol(),
            None
        );
        assert_eq!(AdapterConfig::new("jdbc").url_subprotocol(), None);
    }
}
