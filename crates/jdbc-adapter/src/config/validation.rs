//! Configuration validation.

use super::AdapterConfig;
use crate::error::{AdapterError, Result};

/// Validate the configuration.
pub fn validate(config: &AdapterConfig) -> Result<()> {
    if config.adapter.trim().is_empty() {
        return Err(AdapterError::Config("adapter is required".into()));
    }

    if let Some(url) = &config.url {
        if !url.starts_with("jdbc:") {
            return Err(AdapterError::Config(format!(
                "url must start with 'jdbc:', got '{}'",
                url
            )));
        }
    }

    if let Some(spec) = &config.adapter_spec {
        if spec.trim().is_empty() {
            return Err(AdapterError::Config(
                "adapter_spec cannot be blank when set".into(),
            ));
        }
    }

    if config.pool.size == 0 {
        return Err(AdapterError::Config("pool.size must be at least 1".into()));
    }

    Ok(())
}
