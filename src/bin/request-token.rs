use anyhow::Result;
use chrono::Local;
use clap::{Parser, ValueEnum};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use magento_auth::config::token::TokenSettings;
use magento_auth::config::types::ServiceConfig;
use magento_auth::observability::metrics::get_metrics;
use magento_auth::utils::config_loader;
use magento_auth::utils::logging;
use magento_auth::utils::logging::LogLevel;
use magento_auth::{MagentoTokenRequest, TokenFactory, TokenKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TokenTypeArg {
    Admin,
    Customer,
}

impl From<TokenTypeArg> for TokenKind {
    fn from(value: TokenTypeArg) -> Self {
        match value {
            TokenTypeArg::Admin => TokenKind::Admin,
            TokenTypeArg::Customer => TokenKind::Customer,
        }
    }
}

/// Request an admin or customer token.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file; flags below override its `token` section
    #[arg(short, long, env = "MAGENTO_CONFIG")]
    config: Option<String>,
    /// The token type
    #[arg(short = 't', long, env = "MAGENTO_TOKEN_TYPE", value_enum)]
    token_type: Option<TokenTypeArg>,
    /// Endpoint address of the shop
    #[arg(short = 'a', long, env = "MAGENTO_BASE_ENDPOINT_ADDRESS")]
    base_endpoint_address: Option<String>,
    #[arg(long, env = "MAGENTO_USER_AGENT")]
    user_agent: Option<String>,
    /// Username to generate the access token
    #[arg(short = 'u', long, env = "MAGENTO_TOKEN_REQUEST_USER")]
    user: Option<String>,
    /// User password to generate the access token
    #[arg(short = 'p', long, env = "MAGENTO_TOKEN_REQUEST_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// HTTP basic authentication user name
    #[arg(long, env = "MAGENTO_HTTP_AUTH_USER")]
    http_auth_user: Option<String>,
    /// HTTP basic authentication password
    #[arg(long, env = "MAGENTO_HTTP_AUTH_PASSWORD", hide_env_values = true)]
    http_auth_password: Option<String>,
    #[arg(long)]
    validity_period_seconds: Option<u64>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Print renewal metrics after the token was obtained
    #[arg(long)]
    print_metrics: bool,
}

impl Args {
    fn apply_to(&self, settings: &mut TokenSettings) {
        if let Some(token_type) = self.token_type {
            settings.kind = token_type.into();
        }
        override_with(&mut settings.endpoint, &self.base_endpoint_address);
        override_with(&mut settings.user_agent, &self.user_agent);
        override_with(&mut settings.username, &self.user);
        override_with(&mut settings.password, &self.password);
        override_with(&mut settings.http_auth_user, &self.http_auth_user);
        override_with(&mut settings.http_auth_password, &self.http_auth_password);
        if let Some(seconds) = self.validity_period_seconds {
            settings.validity_period = Some(Duration::from_secs(seconds));
        }
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, apply flags
    // -------------------------------

    let mut service_config = match &args.config {
        Some(path) => config_loader::run(path).await?,
        None => ServiceConfig::default(),
    };
    logging::run(&service_config.settings, args.log_level)?;
    args.apply_to(&mut service_config.token);

    // -------------------------------
    // 2. Configure and request token
    // -------------------------------

    let factory = TokenFactory::system(MagentoTokenRequest::new(Client::new()));
    let mut token = factory.create(&service_config.token)?;

    info!(token_type = %service_config.token.kind, "requesting token");
    let access_token = token.create_or_reuse().await?;

    println!("Token Typ    : <{}>", token.kind()?);
    println!("Username     : {}", token.username()?.unwrap_or("-"));
    println!("Access Token : {}", access_token);
    println!("Is valid     : {}", token.is_valid()?);
    println!(
        "Expires      : {}",
        token
            .expires()?
            .map(|expires| expires.with_timezone(&Local).format("%x %X").to_string())
            .unwrap_or_else(|| "never".to_owned())
    );

    if args.print_metrics {
        print!("{}", get_metrics().await?.render()?);
    }

    Ok(())
}
