//! Tracing and metrics installation.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, LogFormat};
use crate::error::{AppError, Result};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` style directives come from the configuration. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| AppError::Tracing(format!("invalid filter {:?}: {e}", config.log_level)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    installed.map_err(|e| AppError::Tracing(e.to_string()))
}

/// Installs the global Prometheus recorder and returns its handle.
///
/// The handle renders every counter recorded by the services.
pub fn install_metrics() -> Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = AppConfig {
            log_level: "domain=loud".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(init_tracing(&config), Err(AppError::Tracing(_))));
    }
}
