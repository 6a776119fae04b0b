// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::token::{TokenKind, TokenSettings};
use crate::error::TokenRequestError;
use crate::helpers::time::{Clock, FixedClock};
use crate::sources::{TokenRequest, TokenRequestParams};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

pub fn admin_settings(period: Option<Duration>) -> TokenSettings {
    let mut settings = TokenSettings::credentials(TokenKind::Admin, "endpoint", "admin", "1234567");
    settings.validity_period = period;
    settings
}

/// Hands out the given times in order, then keeps repeating the last one.
/// Counts every read.
#[derive(Debug, Clone)]
pub struct SequenceClock {
    inner: Arc<Mutex<SequenceInner>>,
}

#[derive(Debug)]
struct SequenceInner {
    times: VecDeque<DateTime<Utc>>,
    last: DateTime<Utc>,
    reads: usize,
}

impl SequenceClock {
    pub fn new(times: &[DateTime<Utc>]) -> Self {
        let last = *times.last().expect("at least one time");
        Self {
            inner: Arc::new(Mutex::new(SequenceInner {
                times: times.iter().copied().collect(),
                last,
                reads: 0,
            })),
        }
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }
}

impl Clock for SequenceClock {
    fn now(&self) -> DateTime<Utc> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        match inner.times.pop_front() {
            Some(time) => {
                inner.last = time;
                time
            }
            None => inner.last,
        }
    }
}

/// Owned copy of the parameters a `TokenRequest` was called with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: TokenKind,
    pub endpoint: String,
    pub user_agent: Option<String>,
    pub username: String,
    pub password: String,
    pub http_auth_user: Option<String>,
    pub http_auth_password: Option<String>,
}

impl From<&TokenRequestParams<'_>> for RecordedCall {
    fn from(params: &TokenRequestParams<'_>) -> Self {
        Self {
            kind: params.kind,
            endpoint: params.endpoint.to_owned(),
            user_agent: params.user_agent.map(str::to_owned),
            username: params.username.to_owned(),
            password: params.password.to_owned(),
            http_auth_user: params.http_auth_user.map(str::to_owned),
            http_auth_password: params.http_auth_password.map(str::to_owned),
        }
    }
}

/// Request double: records every call and answers `token-<n>` unless a
/// response was queued with `respond_with`.
#[derive(Debug, Clone, Default)]
pub struct RecordingRequest {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    calls: Vec<RecordedCall>,
    responses: VecDeque<Result<String, TokenRequestError>>,
}

impl RecordingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, response: Result<String, TokenRequestError>) {
        self.inner.lock().unwrap().responses.push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }
}

impl TokenRequest for RecordingRequest {
    async fn request_token(&self, params: &TokenRequestParams<'_>) -> Result<String, TokenRequestError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::from(params));
        let n = inner.calls.len();
        inner
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(format!("token-{n}")))
    }
}

/// Request double that takes `delay` of clock time before answering
#[derive(Debug, Clone)]
pub struct SlowRequest {
    pub clock: FixedClock,
    pub delay: TimeDelta,
}

impl TokenRequest for SlowRequest {
    async fn request_token(&self, _params: &TokenRequestParams<'_>) -> Result<String, TokenRequestError> {
        self.clock.advance(self.delay);
        Ok("slow-token".to_owned())
    }
}
