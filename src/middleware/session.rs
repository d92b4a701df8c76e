use std::convert::Infallible;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::auth::Access;

/// Resolve the caller's session once per request. Never rejects: a missing,
/// unknown or expired cookie yields `Access::Anonymous`.
#[async_trait]
impl FromRequestParts<AppState> for Access {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(state.sessions.access_for(&parts.headers).await)
    }
}
