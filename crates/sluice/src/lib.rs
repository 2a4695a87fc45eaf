//! Sluice - re-entrant lazy functional pipelines
//!
//! Build a chain of named stages once, then feed it as often as you like.
//!
//! # Example
//!
//! ```
//! use sluice::prelude::*;
//!
//! let registry = sluice::registry_with(&["built_in_functions"]).unwrap();
//! let largest = registry.pipe().then("max").unwrap().into_pipe().unwrap();
//!
//! assert_eq!(largest.run([3, 9, 4]).unwrap().into_value().unwrap(), Value::Int(9));
//! assert_eq!(largest.run([1, 2]).unwrap().into_value().unwrap(), Value::Int(2));
//! ```

pub mod logging;


pub use sluice_config::{AliasConfig, ConfigError, LoggingConfig, RegistryConfig, SluiceConfig};
pub use sluice_core::{
    AddIn, Arg, CallArgs, ErrorKind, Flow, FlowRef, Func, MapDef, OverwritePolicy, Params,
    PipeError, Pull, Result, StageDef, Value, WrapTarget,
};
pub use sluice_pipe::{
    BypassDef, Confluence, Outcome, Pipe, Registry, Reservoir, StreamHandle, Valve,
};
pub use sluice_stages::{catalog, find};

pub mod prelude {
    pub use super::{CallArgs, Func, Outcome, Pipe, PipeError, Registry, Value};
}

/// A registry knowing every catalog add-in, with `include_on_import`
/// loaded.
pub fn registry() -> Result<Registry> {
    registry_from_config(&SluiceConfig::default())
}

/// Like [`registry`], additionally loading the named add-ins.
pub fn registry_with(add_ins: &[&str]) -> Result<Registry> {
    let config = add_ins
        .iter()
        .fold(SluiceConfig::new(), |config, name| config.with_add_in(*name));
    registry_from_config(&config)
}

/// Builds a registry as described by `config`: collision policy, then
/// add-ins in order, then aliases.
pub fn registry_from_config(config: &SluiceConfig) -> Result<Registry> {
    config
        .validate()
        .map_err(|e| PipeError::Config(e.to_string()))?;
    let mut registry = Registry::new().with_catalog(catalog());
    registry.set_overwrite(config.registry.overwrite);
    let add_ins: Vec<&str> = config.registry.add_ins.iter().map(String::as_str).collect();
    registry.load(&add_ins)?;
    for alias in &config.registry.aliases {
        registry.alias(
            &alias.name,
            &alias.stage,
            alias.star_wrap.clone(),
            alias.double_star_wrap.clone(),
        )?;
    }
    tracing::debug!(
        event = "registry_ready",
        add_ins = add_ins.len(),
        aliases = config.registry.aliases.len(),
    );
    Ok(registry)
}
