//! DTOs exchanged with the integration token endpoint

use serde::{Deserialize, Serialize};

/// Login body posted to `/rest/V1/integration/{admin|customer}/token`
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Error body returned alongside a non-success status
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub message: Option<String>,
}
