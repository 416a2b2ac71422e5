//! Caller identity.
//!
//! The server never authorizes anything itself: it asks a
//! [`SessionProvider`] to turn the request's bearer token into an
//! [`Identity`] and rejects the request when that fails.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid bearer token")]
    InvalidToken,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity, AuthError>;
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Accepts a fixed set of tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashSet<String>,
}

impl StaticTokens {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticTokens {
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        if self.tokens.contains(token) {
            Ok(Identity {
                subject: format!("token:{}", token.chars().take(4).collect::<String>()),
            })
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAnonymous;

#[async_trait]
impl SessionProvider for AllowAnonymous {
    async fn authenticate(&self, _token: Option<&str>) -> Result<Identity, AuthError> {
        Ok(Identity {
            subject: "anonymous".to_string(),
        })
    }
}
