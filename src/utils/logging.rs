use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use anyhow::Result;
use tracing::debug;
use crate::config::settings::{LogFormat, LoggingConfig, SettingsConfig};


#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "TRACE",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::INFO => "INFO",
            LogLevel::WARN => "WARN",
            LogLevel::ERROR => "ERROR",
        }
    }
}


pub fn run(settings: &SettingsConfig, arg_log_level: Option<LogLevel>) -> Result<()> {
    let logging_config = resolve_logging_config(settings, arg_log_level);
    init_logging(&logging_config);
    Ok(())
}

/// Command line level wins over the config file, which wins over `info`
pub fn resolve_logging_config(
    settings: &SettingsConfig,
    arg_log_level: Option<LogLevel>,
) -> LoggingConfig {
    let config = settings.logging.to_owned().unwrap_or_default();
    let level = arg_log_level
        .map(|level| level.as_str().to_lowercase())
        .unwrap_or(config.level);

    LoggingConfig::new(level, config.format)
}


/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false)
                .with_writer(std::io::stderr);

            if let Err(e) = registry.with(layer).try_init() {
                debug!("logging already initialized: {}", e);
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true)
                .with_writer(std::io::stderr);

            if let Err(e) = registry.with(layer).try_init() {
                debug!("logging already initialized: {}", e);
            }
        }
    };
}
