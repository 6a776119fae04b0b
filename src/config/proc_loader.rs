use std::path::Path;
use anyhow::Result;
use regex::Regex;
use tracing::{debug, error};

use crate::config::settings::LoggingConfig;
use crate::config::types::ServiceConfig;

/// Load config from YAML file, expanding `${VAR}` and `${VAR:default}` first
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path).await?;

    let expanded = expand_env_vars(&content)?;
    parse_config(&expanded)
}

pub fn parse_config(content: &str) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(content)
        .inspect_err(|e| error!("parse config error: {}", e))?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }
    debug!(token_type = %service_config.token.kind, "config parsed");

    Ok(service_config)
}

pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    });
    Ok(expanded.into_owned())
}
