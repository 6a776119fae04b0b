//! # Magento REST API token library
//!
//! Obtains and lazily renews the bearer tokens used to authenticate against
//! a shop's REST API, so a caller never sees an expired token and renewal
//! happens only when needed.
//!
//! Modules:
//! - `cache`: the token state machine and its factory
//! - `config`: token settings and the YAML service configuration
//! - `sources`: the credential exchange contract and its HTTP implementation
//! - `helpers`: clock abstraction
//! - `observability`: prometheus metrics for renewals

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token::{RenewableToken, Token};
pub use crate::cache::token_factory::TokenFactory;
pub use crate::config::token::{TokenKind, TokenSettings};
pub use crate::error::{TokenError, TokenRequestError};
pub use crate::helpers::time::{Clock, FixedClock, SystemClock};
pub use crate::sources::{MagentoTokenRequest, TokenRequest, TokenRequestParams};
