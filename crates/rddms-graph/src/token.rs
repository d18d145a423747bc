//! Bearer token providers
//!
//! Token minting happens elsewhere; the engine only asks for an opaque
//! bearer string before each request.

use crate::error::TokenError;
use async_trait::async_trait;

/// Source of bearer credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token
    async fn bearer_token(&self) -> Result<String, TokenError>;
}

/// Fixed token, e.g. taken from the command line or environment
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a token string
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read `var` from the environment
    ///
    /// # Errors
    /// Returns [`TokenError::Missing`] if the variable is unset or blank.
    pub fn from_env(var: &str) -> Result<Self, TokenError> {
        std::env::var(var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Self::new)
            .ok_or(TokenError::Missing)
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, TokenError> {
        if self.token.trim().is_empty() {
            return Err(TokenError::Missing);
        }
        Ok(self.token.clone())
    }
}
