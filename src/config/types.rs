use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::config::token::TokenSettings;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub token: TokenSettings,
}
