//! Query identity keys for the re-fetch cache.

use std::fmt;

use iso_core::QueryConfig;
use serde_json::Value;

/// Identity of a logical query: its name plus its serialized parameters.
///
/// Two configurations with the same name and parameter values produce the
/// same key regardless of how the parameters were assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Build the key for a query configuration.
    pub fn for_config(config: &QueryConfig) -> Self {
        let params = Value::Object(config.params.clone());
        Self(format!("{}|{}", config.name, params))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_combines_name_and_params() {
        let config = QueryConfig::new("Profile").with_param("userId", "user1");
        let key = QueryKey::for_config(&config);
        assert_eq!(key.as_str(), r#"Profile|{"userId":"user1"}"#);
    }

    #[test]
    fn test_same_params_same_key() {
        let a = QueryConfig::new("Profile")
            .with_param("a", 1)
            .with_param("b", 2);
        let b = QueryConfig::new("Profile")
            .with_param("b", 2)
            .with_param("a", 1);
        assert_eq!(QueryKey::for_config(&a), QueryKey::for_config(&b));
    }

    #[test]
    fn test_different_name_different_key() {
        let a = QueryConfig::new("Profile");
        let b = QueryConfig::new("Settings");
        assert_ne!(QueryKey::for_config(&a), QueryKey::for_config(&b));
    }
}
