use crate::cache::token::Token;
use crate::config::token::TokenSettings;
use crate::error::TokenError;
use crate::helpers::time::SystemClock;

/// Mints configured tokens that share the same request and clock collaborators
#[derive(Debug, Clone)]
pub struct TokenFactory<R, C = SystemClock> {
    request: R,
    clock: C,
}

impl<R> TokenFactory<R, SystemClock> {
    /// A factory whose tokens read the system clock
    pub fn system(request: R) -> Self {
        Self::new(request, SystemClock)
    }
}

impl<R, C> TokenFactory<R, C> {
    pub fn new(request: R, clock: C) -> Self {
        Self { request, clock }
    }
}

impl<R: Clone, C: Clone> TokenFactory<R, C> {
    /// Creates a new token and configures it with `settings`
    pub fn create<'a>(
        &self,
        settings: impl Into<Option<&'a TokenSettings>>,
    ) -> Result<Token<R, C>, TokenError> {
        let mut token = Token::new(self.request.clone(), self.clock.clone());
        token.configure(settings)?;
        Ok(token)
    }
}
