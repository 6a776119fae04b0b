use thiserror::Error;

use crate::config::token::TokenKind;

/// Errors raised by the token lifecycle
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("the token is not configured")]
    NotConfigured,

    #[error("token is already configured")]
    AlreadyConfigured,

    #[error("no settings were provided (settings)")]
    NullSettings,

    #[error("no access token provided for static token type (settings.static_value)")]
    MissingStaticValue,

    #[error("the base endpoint address is not set (settings.endpoint)")]
    MissingEndpoint,

    #[error("the username for requesting tokens is not set (settings.username)")]
    MissingUsername,

    #[error("the user password for requesting tokens is not set (settings.password)")]
    MissingPassword,

    #[error("token type '{0}' is not supported (settings.kind)")]
    UnsupportedKind(TokenKind),

    #[error("validity period is out of range (settings.validity_period)")]
    InvalidValidityPeriod,

    #[error("could not request token: {0}")]
    RequestFailed(#[from] TokenRequestError),
}

/// Errors raised while exchanging credentials for a token
#[derive(Debug, Error)]
pub enum TokenRequestError {
    #[error("the token type '{0}' is not supported")]
    UnsupportedKind(TokenKind),

    #[error("the {0} must be set")]
    MissingArgument(&'static str),

    /// The authority answered with a non-success status
    #[error("Error: {reason} ({status}).{}", detail(.message))]
    Rejected {
        status: u16,
        reason: String,
        /// Diagnostic message extracted from the response body, if any
        message: Option<String>,
    },

    #[error("error sending request to authority")]
    Send(#[source] reqwest::Error),

    #[error("error reading response body")]
    BodyRead(#[source] reqwest::Error),

    #[error("error deserializing token body from authority")]
    Decode(#[from] serde_json::Error),

    #[error("authority returned an empty token")]
    EmptyToken,

    #[error("{0}")]
    Other(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" {m}"))
        .unwrap_or_default()
}
