use tracing_subscriber::EnvFilter;

use crate::app::config::LoggingSettings;

fn default_directive(settings: &LoggingSettings) -> String {
    match settings.log_level.trim().to_lowercase().as_str() {
        "" => "info".to_string(),
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Debug builds always log in the human-readable format.
fn use_json(settings: &LoggingSettings) -> bool {
    settings.json && !cfg!(debug_assertions)
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(settings)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json(settings) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_target(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init();
    }
}
