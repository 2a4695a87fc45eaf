//! Log output for applications embedding sluice.
//!
//! The engine emits `tracing` events; nothing is printed until a
//! subscriber is installed. [`init`] installs a formatting one.

use std::sync::OnceLock;

use sluice_config::LoggingConfig;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs a formatting subscriber filtered by `config.filter`.
///
/// Safe to call multiple times - only the first call has effect. An
/// unparsable filter falls back to `warn`. `RUST_LOG` directives, when
/// set, are added on top.
pub fn init(config: &LoggingConfig) {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::try_new(&config.filter)
            .unwrap_or_else(|_| EnvFilter::new(LoggingConfig::default().filter));
        if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
            for directive in env.split(',').filter_map(|d| d.parse::<Directive>().ok()) {
                filter = filter.add_directive(directive);
            }
        }

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
    });
}

/// Returns true once [`init`] has run.
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            filter: "not a [valid filter".to_string(),
        };
        init(&config);
        init(&LoggingConfig::default());
        assert!(is_initialized());
    }
}
