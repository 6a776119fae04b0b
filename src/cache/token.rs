use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::token::{is_blank, TokenKind, TokenSettings};
use crate::error::{TokenError, TokenRequestError};
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::sources::{TokenRequest, TokenRequestParams};
use crate::utils::constants::{DEFAULT_ADMIN_VALIDITY_PERIOD, DEFAULT_CUSTOMER_VALIDITY_PERIOD};

/// A bearer credential that is renewed on demand
pub trait RenewableToken {
    /// Returns true while the cached token may still be used
    fn is_valid(&self) -> Result<bool, TokenError>;

    /// Expiry of the cached token, absent for static tokens and before the first fetch
    fn expires(&self) -> Result<Option<DateTime<Utc>>, TokenError>;

    /// Returns the cached token, requesting a new one first if it is no longer valid
    fn create_or_reuse(&mut self) -> impl Future<Output = Result<String, TokenError>> + Send;
}

/// Token lifecycle: unconfigured until `configure` succeeds, then ready for good
enum TokenState {
    Unconfigured,
    Ready(Credential),
}

enum Credential {
    /// Pre-issued integration token
    Static { value: String },
    /// Admin or customer token exchanged for username and password
    Renewable(RenewableCredential),
}

struct RenewableCredential {
    kind: TokenKind,
    endpoint: String,
    user_agent: Option<String>,
    username: String,
    password: String,
    http_auth_user: Option<String>,
    http_auth_password: Option<String>,
    validity_period: Duration,
    validity_delta: TimeDelta,
    cached: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

/// Caches a token string and renews it once its validity period has elapsed.
///
/// Not synchronized: renewal and configuration need `&mut self`, callers that
/// share a token across tasks wrap it in their own lock.
pub struct Token<R, C = SystemClock> {
    request: R,
    clock: C,
    state: TokenState,
}

impl<R, C> Token<R, C> {
    /// Creates an unconfigured token bound to its collaborators
    pub fn new(request: R, clock: C) -> Self {
        Self {
            request,
            clock,
            state: TokenState::Unconfigured,
        }
    }

    /// Configures the token. Succeeds at most once per instance; a failed
    /// attempt leaves the token unconfigured.
    pub fn configure<'a>(
        &mut self,
        settings: impl Into<Option<&'a TokenSettings>>,
    ) -> Result<&mut Self, TokenError> {
        if let TokenState::Ready(_) = self.state {
            return Err(TokenError::AlreadyConfigured);
        }
        let settings = settings.into().ok_or(TokenError::NullSettings)?;

        let credential = Credential::resolve(settings)
            .inspect_err(|e| warn!(token_type = %settings.kind, "token configuration rejected: {}", e))?;

        debug!(
            token_type = %settings.kind,
            validity_period_seconds = credential.validity_period().map(|p| p.as_secs()),
            "token configured"
        );
        self.state = TokenState::Ready(credential);
        Ok(self)
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, TokenState::Ready(_))
    }

    pub fn expires(&self) -> Result<Option<DateTime<Utc>>, TokenError> {
        Ok(match self.credential()? {
            Credential::Static { .. } => None,
            Credential::Renewable(c) => c.expires_at,
        })
    }

    pub fn kind(&self) -> Result<TokenKind, TokenError> {
        Ok(match self.credential()? {
            Credential::Static { .. } => TokenKind::Static,
            Credential::Renewable(c) => c.kind,
        })
    }

    pub fn validity_period(&self) -> Result<Option<Duration>, TokenError> {
        Ok(self.credential()?.validity_period())
    }

    pub fn endpoint(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.map(|c| c.endpoint.as_str()))
    }

    pub fn username(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.map(|c| c.username.as_str()))
    }

    pub fn password(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.map(|c| c.password.as_str()))
    }

    pub fn user_agent(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.and_then(|c| c.user_agent.as_deref()))
    }

    pub fn http_auth_user(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.and_then(|c| c.http_auth_user.as_deref()))
    }

    pub fn http_auth_password(&self) -> Result<Option<&str>, TokenError> {
        Ok(self.renewable()?.and_then(|c| c.http_auth_password.as_deref()))
    }

    fn credential(&self) -> Result<&Credential, TokenError> {
        match &self.state {
            TokenState::Unconfigured => Err(TokenError::NotConfigured),
            TokenState::Ready(credential) => Ok(credential),
        }
    }

    fn renewable(&self) -> Result<Option<&RenewableCredential>, TokenError> {
        Ok(match self.credential()? {
            Credential::Static { .. } => None,
            Credential::Renewable(c) => Some(c),
        })
    }
}

impl<R, C: Clock> Token<R, C> {
    /// Static tokens are always valid once configured. Renewable tokens are
    /// valid while a token is cached and `now < expires`; the clock is read
    /// once, and only when there is something cached.
    pub fn is_valid(&self) -> Result<bool, TokenError> {
        Ok(match self.credential()? {
            Credential::Static { .. } => true,
            Credential::Renewable(c) => c.is_valid(&self.clock),
        })
    }
}

impl<R: TokenRequest, C: Clock> Token<R, C> {
    /// Returns the cached token or requests a new one if it expired.
    ///
    /// Expiry is measured from the moment the request is issued. Request
    /// failures propagate unchanged and leave the cached state as it was.
    pub async fn create_or_reuse(&mut self) -> Result<String, TokenError> {
        let credential = match &mut self.state {
            TokenState::Unconfigured => return Err(TokenError::NotConfigured),
            TokenState::Ready(credential) => credential,
        };

        match credential {
            Credential::Static { value } => Ok(value.clone()),
            Credential::Renewable(c) => c.create_or_reuse(&self.request, &self.clock).await,
        }
    }
}

impl<R, C> RenewableToken for Token<R, C>
where
    R: TokenRequest + Send + Sync,
    C: Clock + Send + Sync,
{
    fn is_valid(&self) -> Result<bool, TokenError> {
        Token::is_valid(self)
    }

    fn expires(&self) -> Result<Option<DateTime<Utc>>, TokenError> {
        Token::expires(self)
    }

    fn create_or_reuse(&mut self) -> impl Future<Output = Result<String, TokenError>> + Send {
        Token::create_or_reuse(self)
    }
}

impl<R, C> fmt::Debug for Token<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Token");
        match &self.state {
            TokenState::Unconfigured => s.field("configured", &false),
            TokenState::Ready(Credential::Static { .. }) => s
                .field("configured", &true)
                .field("kind", &TokenKind::Static),
            TokenState::Ready(Credential::Renewable(c)) => s
                .field("configured", &true)
                .field("kind", &c.kind)
                .field("endpoint", &c.endpoint)
                .field("username", &c.username)
                .field("validity_period", &c.validity_period)
                .field("cached", &c.cached.is_some())
                .field("expires_at", &c.expires_at),
        };
        s.finish()
    }
}

impl Credential {
    fn resolve(settings: &TokenSettings) -> Result<Self, TokenError> {
        match settings.kind {
            TokenKind::Static => {
                if is_blank(&settings.static_value) {
                    return Err(TokenError::MissingStaticValue);
                }
                Ok(Credential::Static {
                    value: settings.static_value.clone().unwrap_or_default(),
                })
            }
            TokenKind::Admin | TokenKind::Customer => {
                RenewableCredential::resolve(settings).map(Credential::Renewable)
            }
            TokenKind::Undefined => Err(TokenError::UnsupportedKind(settings.kind)),
        }
    }

    fn validity_period(&self) -> Option<Duration> {
        match self {
            Credential::Static { .. } => None,
            Credential::Renewable(c) => Some(c.validity_period),
        }
    }
}

impl RenewableCredential {
    fn resolve(settings: &TokenSettings) -> Result<Self, TokenError> {
        let validity_period = settings.validity_period.unwrap_or(match settings.kind {
            TokenKind::Customer => DEFAULT_CUSTOMER_VALIDITY_PERIOD,
            _ => DEFAULT_ADMIN_VALIDITY_PERIOD,
        });

        if is_blank(&settings.endpoint) {
            return Err(TokenError::MissingEndpoint);
        }
        if is_blank(&settings.username) {
            return Err(TokenError::MissingUsername);
        }
        // an empty password is allowed, an absent one is not
        let password = settings
            .password
            .clone()
            .ok_or(TokenError::MissingPassword)?;

        let validity_delta =
            TimeDelta::from_std(validity_period).map_err(|_| TokenError::InvalidValidityPeriod)?;

        Ok(Self {
            kind: settings.kind,
            endpoint: settings.endpoint.clone().unwrap_or_default(),
            user_agent: settings.user_agent.clone(),
            username: settings.username.clone().unwrap_or_default(),
            password,
            http_auth_user: settings.http_auth_user.clone(),
            http_auth_password: settings.http_auth_password.clone(),
            validity_period,
            validity_delta,
            cached: None,
            expires_at: None,
        })
    }

    fn is_valid<C: Clock>(&self, clock: &C) -> bool {
        match (&self.cached, self.expires_at) {
            (Some(_), Some(expires_at)) => clock.now() < expires_at,
            _ => false,
        }
    }

    fn params(&self) -> TokenRequestParams<'_> {
        TokenRequestParams {
            kind: self.kind,
            endpoint: &self.endpoint,
            user_agent: self.user_agent.as_deref(),
            username: &self.username,
            password: &self.password,
            http_auth_user: self.http_auth_user.as_deref(),
            http_auth_password: self.http_auth_password.as_deref(),
        }
    }

    async fn create_or_reuse<R: TokenRequest, C: Clock>(
        &mut self,
        request: &R,
        clock: &C,
    ) -> Result<String, TokenError> {
        if self.is_valid(clock) {
            if let Some(token) = &self.cached {
                debug!(token_type = %self.kind, expires_at = ?self.expires_at, "reusing cached token");
                record_reuse(self.kind).await;
                return Ok(token.clone());
            }
        }

        // expiry counts from the moment the request goes out
        let now = clock.now();
        let expires_at = now
            .checked_add_signed(self.validity_delta)
            .ok_or(TokenError::InvalidValidityPeriod)?;

        debug!(token_type = %self.kind, endpoint = %self.endpoint, "token is not valid, requesting a new one");
        let started = Instant::now();
        let result = request.request_token(&self.params()).await;
        record_request(self.kind, started.elapsed(), &result, expires_at).await;

        let token = result.inspect_err(|e| {
            error!(token_type = %self.kind, endpoint = %self.endpoint, "token request failed: {}", e)
        })?;

        info!(token_type = %self.kind, expires_at = %expires_at, "token renewed");
        self.cached = Some(token.clone());
        self.expires_at = Some(expires_at);
        Ok(token)
    }
}

async fn record_reuse(kind: TokenKind) {
    match get_metrics().await {
        Ok(metrics) => metrics.token_reuse.with_label_values(&[kind.as_str()]).inc(),
        Err(e) => warn!("metrics unavailable: {}", e),
    }
}

async fn record_request(
    kind: TokenKind,
    elapsed: Duration,
    result: &Result<String, TokenRequestError>,
    expires_at: DateTime<Utc>,
) {
    let metrics = match get_metrics().await {
        Ok(metrics) => metrics,
        Err(e) => {
            warn!("metrics unavailable: {}", e);
            return;
        }
    };
    let labels = [kind.as_str()];
    metrics.token_requests.with_label_values(&labels).inc();
    metrics
        .token_request_duration
        .with_label_values(&labels)
        .observe(elapsed.as_secs_f64());
    match result {
        Ok(_) => metrics
            .token_expiry_unix
            .with_label_values(&labels)
            .set(expires_at.timestamp()),
        Err(_) => metrics.token_request_failures.with_label_values(&labels).inc(),
    }
}
