use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "recoverly.sid";

/// How long a login `state` stays valid between redirect and callback
const LOGIN_STATE_TTL_MINUTES: i64 = 10;

/// The identity attached to an authenticated session
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub display_name: String,
}

/// Request-scoped capability describing who is calling.
///
/// Every resource operation takes one of these, so the session decision is
/// made in one place for all routes.
#[derive(Clone, Debug)]
pub enum Access {
    Anonymous,
    Session(SessionUser),
}

impl Access {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Access::Session(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Access::Session(user) => Some(user),
            Access::Anonymous => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Session {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// Server-side session state plus the OAuth `state` values awaiting a callback
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
    pending: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(ttl_hours: u64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours as i64),
            sessions: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Start a session, dropping any that have already expired
    pub async fn create(&self, user: SessionUser) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let session = Session {
            user,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| existing.expires_at > now);
        sessions.insert(id, session);
        id
    }

    #[cfg(test)]
    async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Resolve a session id, evicting it if it has expired
    pub async fn lookup(&self, id: Uuid) -> Option<SessionUser> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&id) {
                Some(session) if session.expires_at > now => return Some(session.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(&id);
        tracing::debug!("Evicted expired session {}", id);
        None
    }

    pub async fn destroy(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Resolve the session named by the request's cookie
    pub async fn access_for(&self, headers: &HeaderMap) -> Access {
        match session_id_from_headers(headers) {
            Some(id) => match self.lookup(id).await {
                Some(user) => Access::Session(user),
                None => Access::Anonymous,
            },
            None => Access::Anonymous,
        }
    }

    /// Mint a one-shot `state` for a login redirect
    pub async fn begin_login(&self) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        pending.retain(|_, issued| now - *issued < Duration::minutes(LOGIN_STATE_TTL_MINUTES));
        pending.insert(state.clone(), now);
        state
    }

    /// Consume a pending `state`; false if it was never issued or has expired
    pub async fn consume_login(&self, state: &str) -> bool {
        match self.pending.write().await.remove(state) {
            Some(issued) => Utc::now() - issued < Duration::minutes(LOGIN_STATE_TTL_MINUTES),
            None => false,
        }
    }
}

/// Find the session cookie among the request's Cookie headers
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Set-Cookie value for a freshly created session
pub fn session_cookie(id: Uuid, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, id, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
