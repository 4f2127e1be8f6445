//! Flat key/value property sources.
//!
//! Cluster descriptors read their configuration from a [`PropertySource`]
//! handed to them by the caller. The trait is the injection seam: the
//! application decides whether values come from a parsed properties file,
//! the process environment, or a map assembled in code.

use std::collections::HashMap;

/// A flat, dot-separated key/value namespace.
pub trait PropertySource {
    /// Look up a property by its full name, e.g. `core.mongo.db`.
    fn get(&self, name: &str) -> Option<String>;

    /// Look up a property, falling back to `otherwise` when absent.
    fn get_or(&self, name: &str, otherwise: &str) -> String {
        self.get(name).unwrap_or_else(|| otherwise.to_string())
    }
}

impl PropertySource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Property source backed by the process environment.
///
/// Dots and dashes map to underscores and the name is upper-cased, so
/// `core.mongo.db` resolves from `CORE_MONGO_DB`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl PropertySource for EnvProperties {
    fn get(&self, name: &str) -> Option<String> {
        let key = name.replace(['.', '-'], "_").to_ascii_uppercase();
        std::env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source() -> HashMap<String, String> {
        HashMap::from([
            ("app.name".to_string(), "orders".to_string()),
            ("app.blank".to_string(), "".to_string()),
        ])
    }

    #[test]
    fn test_map_get() {
        let props = source();
        assert_eq!(PropertySource::get(&props, "app.name"), Some("orders".to_string()));
        assert_eq!(PropertySource::get(&props, "app.missing"), None);
    }

    #[test]
    fn test_map_get_or() {
        let props = source();
        assert_eq!(props.get_or("app.name", "fallback"), "orders");
        assert_eq!(props.get_or("app.missing", "fallback"), "fallback");
        // present-but-empty is still a value, not a fallback case
        assert_eq!(props.get_or("app.blank", "fallback"), "");
    }

    #[test]
    fn test_env_key_mapping() {
        // SAFETY: test-local variable, no concurrent reader depends on it
        unsafe { std::env::set_var("MONGROVE_TEST_HOST_A_ADDR", "db.internal") };
        let props = EnvProperties;
        assert_eq!(
            props.get("mongrove-test.host.a.addr"),
            Some("db.internal".to_string())
        );
        assert_eq!(props.get("mongrove-test.host.a.port"), None);
    }
}
