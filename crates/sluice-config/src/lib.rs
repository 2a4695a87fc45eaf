//! Configuration system for sluice.
//!
//! Describes which add-ins a registry loads, how name collisions are
//! handled, extra aliases with their own spread directives, and the log
//! filter. Loadable from TOML or YAML.
//!
//! # Examples
//!
//! ```
//! use sluice_config::{SluiceConfig, WrapTarget};
//!
//! let config = SluiceConfig::from_toml_str(r#"
//!     [registry]
//!     add_ins = ["include_on_import", "built_in_functions"]
//!
//!     [[registry.aliases]]
//!     name = "biggest"
//!     stage = "max"
//!     double_star_wrap = "key"
//! "#).unwrap();
//!
//! assert_eq!(config.registry.add_ins.len(), 2);
//! assert_eq!(
//!     config.registry.aliases[0].double_star_wrap,
//!     Some(WrapTarget::Name("key".to_string()))
//! );
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sluice_core::{OverwritePolicy, WrapTarget};


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main sluice configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SluiceConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SluiceConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or
    /// describes an invalid registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Adds an add-in to load.
    pub fn with_add_in(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.registry.add_ins.contains(&name) {
            self.registry.add_ins.push(name);
        }
        self
    }

    /// Sets the collision policy.
    pub fn with_overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.registry.overwrite = policy;
        self
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: AliasConfig) -> Self {
        self.registry.aliases.push(alias);
        self
    }

    /// Sets the log filter directive.
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }

    /// Checks what deserialization cannot: alias names and spread
    /// directives.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for alias in &self.registry.aliases {
            if alias.name.is_empty() || alias.stage.is_empty() {
                return Err(ConfigError::Invalid(
                    "aliases need both a name and a stage".to_string(),
                ));
            }
            if alias.star_wrap.is_some() && alias.double_star_wrap.is_some() {
                return Err(ConfigError::Invalid(format!(
                    "alias '{}' sets both star_wrap and double_star_wrap",
                    alias.name
                )));
            }
            if !names.insert(alias.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "alias '{}' is defined twice",
                    alias.name
                )));
            }
        }
        Ok(())
    }
}

/// What the registry contains.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryConfig {
    /// Add-ins loaded at startup, in order.
    #[serde(default = "default_add_ins")]
    pub add_ins: Vec<String>,

    #[serde(default)]
    pub overwrite: OverwritePolicy,

    #[serde(default)]
    pub aliases: Vec<AliasConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            add_ins: default_add_ins(),
            overwrite: OverwritePolicy::default(),
            aliases: Vec::new(),
        }
    }
}

fn default_add_ins() -> Vec<String> {
    vec!["include_on_import".to_string()]
}

/// An existing stage registered again under another name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AliasConfig {
    pub name: String,
    pub stage: String,

    /// Index or keyword name of the argument to spread positionally.
    #[serde(default)]
    pub star_wrap: Option<WrapTarget>,

    /// Index or keyword name of the argument to spread by name.
    #[serde(default)]
    pub double_star_wrap: Option<WrapTarget>,
}

impl AliasConfig {
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
            star_wrap: None,
            double_star_wrap: None,
        }
    }

    pub fn with_star_wrap(mut self, target: impl Into<WrapTarget>) -> Self {
        self.star_wrap = Some(target.into());
        self
    }

    pub fn with_double_star_wrap(mut self, target: impl Into<WrapTarget>) -> Self {
        self.double_star_wrap = Some(target.into());
        self
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"warn"` or `"sluice_pipe=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}
