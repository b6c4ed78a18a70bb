use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "phyllo_engine=debug,wgpu_core=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Filter used when neither the config nor `RUST_LOG` provide one.
///
/// wgpu, naga and naga_oil are held at warn.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn,naga_oil=warn";

static INIT: Once = Once::new();

/// Resolves the effective filter string: explicit config, then `RUST_LOG`,
/// then [`DEFAULT_FILTER`].
pub fn resolve_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    config
        .env_filter
        .clone()
        .or(rust_log)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initializes the global logger once.
///
/// Subsequent calls are ignored. Call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = resolve_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized ({filter})");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_env() {
        let config = LoggingConfig {
            env_filter: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_filter(&config, Some("trace".to_string())), "debug");
    }

    #[test]
    fn env_filter_used_when_config_empty() {
        let config = LoggingConfig::default();
        assert_eq!(resolve_filter(&config, Some("warn".to_string())), "warn");
    }

    #[test]
    fn blank_values_fall_back_to_default() {
        let config = LoggingConfig::default();
        assert_eq!(resolve_filter(&config, Some("  ".to_string())), DEFAULT_FILTER);
        assert_eq!(resolve_filter(&config, None), DEFAULT_FILTER);
    }
}
