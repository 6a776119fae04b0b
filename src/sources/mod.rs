//! Sources module
//!
//! Defines the contract for exchanging credentials for a fresh token and the
//! HTTP implementation talking to the shop's REST API.

use std::fmt;
use std::future::Future;

use crate::config::token::TokenKind;
use crate::error::TokenRequestError;

pub mod dto;
pub mod magento;

pub use magento::MagentoTokenRequest;

/// Everything the authority needs to issue an admin or customer token
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenRequestParams<'a> {
    pub kind: TokenKind,
    pub endpoint: &'a str,
    pub user_agent: Option<&'a str>,
    pub username: &'a str,
    pub password: &'a str,
    pub http_auth_user: Option<&'a str>,
    pub http_auth_password: Option<&'a str>,
}

impl fmt::Debug for TokenRequestParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequestParams")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"***")
            .field("http_auth_user", &self.http_auth_user)
            .field("http_auth_password", &self.http_auth_password.map(|_| "***"))
            .finish()
    }
}

/// Exchanges credentials for a freshly issued token string
pub trait TokenRequest {
    fn request_token(
        &self,
        params: &TokenRequestParams<'_>,
    ) -> impl Future<Output = Result<String, TokenRequestError>> + Send;
}
