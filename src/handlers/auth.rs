use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::session::{session_cookie, session_id_from_headers};
use crate::auth::{AuthError, SessionUser, SESSION_COOKIE};
use crate::error::found;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google - send the browser to the consent screen
pub async fn google_login(State(state): State<AppState>) -> Response {
    let login_state = state.sessions.begin_login().await;
    found(&state.provider.authorize_url(&login_state))
}

/// GET /auth/google/callback - finish the code flow and open a session
pub async fn google_callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    match complete_login(&state, query).await {
        Ok((session_id, user)) => {
            tracing::info!(
                user_id = %user.id,
                display_name = %user.display_name,
                "successfully authenticated user, redirecting to {}",
                state.config.oauth.success_redirect
            );
            let cookie = session_cookie(
                session_id,
                state.sessions.ttl_seconds(),
                state.config.security.secure_cookies,
            );
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, state.config.oauth.success_redirect.clone()),
                    (header::SET_COOKIE, cookie),
                ],
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Google login failed: {}", e);
            found("/")
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: CallbackQuery,
) -> Result<(uuid::Uuid, SessionUser), AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::ProviderDenied(error));
    }
    let login_state = query.state.ok_or(AuthError::UnknownState)?;
    if !state.sessions.consume_login(&login_state).await {
        return Err(AuthError::UnknownState);
    }
    let code = query.code.ok_or(AuthError::MissingCode)?;

    let profile = state.provider.exchange_code(&code).await?;
    let user = SessionUser {
        id: profile.id,
        display_name: profile.display_name,
    };
    let session_id = state.sessions.create(user.clone()).await;
    Ok((session_id, user))
}

/// GET /auth/logout - drop the session and clear the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id_from_headers(&headers) {
        if state.sessions.destroy(id).await {
            tracing::debug!("session {} logged out", id);
        }
    }
    let cleared = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/".to_string()), (header::SET_COOKIE, cleared)],
    )
        .into_response()
}
