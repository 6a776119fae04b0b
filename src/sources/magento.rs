use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::token::TokenKind;
use crate::error::TokenRequestError;
use crate::sources::dto::{ErrorResponse, LoginRequest};
use crate::sources::{TokenRequest, TokenRequestParams};
use crate::utils::constants::TOKEN_PATH_TEMPLATE;

/// Requests admin and customer tokens from the shop's integration endpoint
#[derive(Debug, Clone, Default)]
pub struct MagentoTokenRequest {
    client: Client,
}

impl MagentoTokenRequest {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the token URL for `kind` below `endpoint`
    pub fn token_url(kind: TokenKind, endpoint: &str) -> Result<String, TokenRequestError> {
        let type_url_part = match kind {
            TokenKind::Admin => "admin",
            TokenKind::Customer => "customer",
            other => return Err(TokenRequestError::UnsupportedKind(other)),
        };
        if endpoint.trim().is_empty() {
            return Err(TokenRequestError::MissingArgument("endpoint address"));
        }
        Ok(format!(
            "{}{}",
            endpoint.trim_end_matches('/'),
            TOKEN_PATH_TEMPLATE.replace("{type}", type_url_part)
        ))
    }
}

impl TokenRequest for MagentoTokenRequest {
    async fn request_token(&self, params: &TokenRequestParams<'_>) -> Result<String, TokenRequestError> {
        request_token(&self.client, params).await
    }
}

#[tracing::instrument(
    err,
    skip(client, params),
    fields(
        token_type = %params.kind,
        endpoint = %params.endpoint,
        username = %params.username,
    ),
)]
async fn request_token(
    client: &Client,
    params: &TokenRequestParams<'_>,
) -> Result<String, TokenRequestError> {
    let url = MagentoTokenRequest::token_url(params.kind, params.endpoint)?;
    if params.username.trim().is_empty() {
        return Err(TokenRequestError::MissingArgument("user"));
    }
    if params.password.trim().is_empty() {
        return Err(TokenRequestError::MissingArgument("password"));
    }

    let mut request = client
        .post(&url)
        .header(ACCEPT, "application/json")
        .json(&LoginRequest {
            username: params.username,
            password: params.password,
        });

    if let Some(user_agent) = params.user_agent.filter(|ua| !ua.trim().is_empty()) {
        request = request.header(USER_AGENT, user_agent);
    }
    if let (Some(user), Some(password)) = (
        params.http_auth_user.filter(|u| !u.is_empty()),
        params.http_auth_password.filter(|p| !p.is_empty()),
    ) {
        request = request.basic_auth(user, Some(password));
    }

    debug!(url = %url, "requesting token from authority");
    let response = request.send().await.map_err(TokenRequestError::Send)?;
    let status = response.status();

    debug!(
        response.status = status.as_u16(),
        "received token response from authority"
    );

    if !status.is_success() {
        let message = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message),
            Err(e) => {
                warn!("could not read error body: {}", e);
                None
            }
        };
        return Err(TokenRequestError::Rejected {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
            message,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(TokenRequestError::BodyRead)?;
    let token: String = serde_json::from_slice(&body)?;
    if token.trim().is_empty() {
        return Err(TokenRequestError::EmptyToken);
    }

    info!("received new token");
    Ok(token)
}
