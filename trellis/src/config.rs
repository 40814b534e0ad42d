//! Kernel configuration and the startup registration tables.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use trellis_core::{Subscriber, UserProvider};

/// Configuration failures. Fatal at startup, never recoverable through the
/// exception pipeline.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The discovery map is absent or empty.
    #[error("`route_discovery` must be a non-empty namespace-to-directory map")]
    MissingDiscovery,

    /// A configured subscriber key has no factory.
    #[error("subscriber `{0}` is not registered")]
    UnknownSubscriber(String),

    /// The configured user provider key has no factory.
    #[error("user provider `{0}` is not registered")]
    UnknownProvider(String),

    /// The kernel cannot be built without an annotation reader.
    #[error("an annotation reader must be supplied before building the kernel")]
    MissingAnnotationReader,
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("cache")
}

/// Kernel configuration, supplied at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelConfig {
    /// Ordered list of subscriber keys to register on the bus at startup.
    #[serde(default)]
    pub subscribers: Vec<String>,

    /// Namespace-to-directory map driving route discovery. Required,
    /// non-empty.
    #[serde(default)]
    pub route_discovery: BTreeMap<String, PathBuf>,

    /// Key of a factory producing the identity service, constructed once.
    #[serde(default)]
    pub user_provider: Option<String>,

    /// When true, discovery caching is disabled and routes are re-scanned on
    /// every startup.
    #[serde(default)]
    pub debug: bool,

    /// Where persisted discovery caches live when not in debug mode.
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,
}

impl KernelConfig {
    /// Minimal in-code configuration: one discovery mapping, debug mode off.
    pub fn new(route_discovery: BTreeMap<String, PathBuf>) -> Self {
        Self {
            subscribers: Vec::new(),
            route_discovery,
            user_provider: None,
            debug: false,
            cache_directory: default_cache_directory(),
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration's shape. The discovery map must be a
    /// non-empty mapping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.route_discovery.is_empty() {
            return Err(ConfigError::MissingDiscovery);
        }
        Ok(())
    }
}

type SubscriberFactory = Box<dyn Fn() -> Arc<dyn Subscriber> + Send + Sync>;

/// Registration table mapping stable subscriber keys to factories.
///
/// The embedding application populates this at startup; configuration then
/// names keys in order. The kernel never constructs subscribers by
/// reflection.
#[derive(Default)]
pub struct SubscriberRegistry {
    factories: HashMap<String, SubscriberFactory>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Subscriber> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Register a factory, builder style.
    pub fn with<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Subscriber> + Send + Sync + 'static,
    {
        self.register(key, factory);
        self
    }

    /// Construct the subscriber registered under `key`.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn Subscriber>> {
        self.factories.get(key).map(|factory| factory())
    }
}

type ProviderFactory = Box<dyn Fn() -> Arc<dyn UserProvider> + Send + Sync>;

/// Registration table for identity-service factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn UserProvider> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Register a factory, builder style.
    pub fn with<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn UserProvider> + Send + Sync + 'static,
    {
        self.register(key, factory);
        self
    }

    /// Construct the provider registered under `key`.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn UserProvider>> {
        self.factories.get(key).map(|factory| factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let config = KernelConfig::from_toml_str(
            r#"
            subscribers = ["logging", "cors"]
            user_provider = "sessions"
            debug = true
            cache_directory = "/tmp/trellis-cache"

            [route_discovery]
            app = "src/handlers"
            admin = "src/admin"
            "#,
        )
        .unwrap();

        assert_eq!(config.subscribers, vec!["logging", "cors"]);
        assert_eq!(config.user_provider.as_deref(), Some("sessions"));
        assert!(config.debug);
        assert_eq!(config.route_discovery.len(), 2);
        assert_eq!(
            config.route_discovery.get("app"),
            Some(&PathBuf::from("src/handlers"))
        );
    }

    #[test]
    fn missing_discovery_map_is_fatal() {
        let result = KernelConfig::from_toml_str("debug = false");
        assert!(matches!(result, Err(ConfigError::MissingDiscovery)));
    }

    #[test]
    fn empty_discovery_map_is_fatal() {
        let result = KernelConfig::from_toml_str("[route_discovery]");
        assert!(matches!(result, Err(ConfigError::MissingDiscovery)));
    }

    #[test]
    fn defaults_apply() {
        let config = KernelConfig::from_toml_str(
            r#"
            [route_discovery]
            app = "handlers"
            "#,
        )
        .unwrap();
        assert!(!config.debug);
        assert!(config.subscribers.is_empty());
        assert_eq!(config.cache_directory, PathBuf::from("cache"));
    }
}
