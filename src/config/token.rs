use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// ================================
/// Token kinds
/// ================================
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Default value, never accepted by `Token::configure`
    #[default]
    Undefined,
    /// Pre-issued integration token, never renewed
    #[serde(alias = "integration")]
    Static,
    Admin,
    Customer,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Undefined => "undefined",
            TokenKind::Static => "static",
            TokenKind::Admin => "admin",
            TokenKind::Customer => "customer",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ================================
/// Token settings
/// ================================
/// Supplied once to `Token::configure`. Which fields are required depends on `kind`:
/// `static_value` for static tokens, `endpoint` + `username` + `password` for
/// admin and customer tokens.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenSettings {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: TokenKind,
    #[serde(default, alias = "access_token")]
    pub static_value: Option<String>,
    #[serde(
        default,
        rename = "validity_period_seconds",
        deserialize_with = "deserialize_seconds"
    )]
    pub validity_period: Option<Duration>,
    #[serde(default, alias = "base_endpoint_address")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub http_auth_user: Option<String>,
    #[serde(default)]
    pub http_auth_password: Option<String>,
}

impl TokenSettings {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Settings for a pre-issued integration token
    pub fn static_token(value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Static,
            static_value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Settings for an admin or customer token renewed with credentials
    pub fn credentials(
        kind: TokenKind,
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            endpoint: Some(endpoint.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn with_validity_period(mut self, period: Duration) -> Self {
        self.validity_period = Some(period);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_http_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.http_auth_user = Some(user.into());
        self.http_auth_password = Some(password.into());
        self
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("kind", &self.kind)
            .field("static_value", &redacted(&self.static_value))
            .field("validity_period", &self.validity_period)
            .field("endpoint", &self.endpoint)
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("http_auth_user", &self.http_auth_user)
            .field("http_auth_password", &redacted(&self.http_auth_password))
            .finish()
    }
}

/// True when the value is absent or contains only whitespace
pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "***")
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds: Option<u64> = Option::deserialize(deserializer)?;
    Ok(seconds.map(Duration::from_secs))
}
