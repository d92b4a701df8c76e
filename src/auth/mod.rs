pub mod provider;
pub mod session;

use thiserror::Error;

pub use provider::{GoogleProvider, IdentityProvider, ProviderProfile};
pub use session::{Access, SessionStore, SessionUser, SESSION_COOKIE};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity provider returned an error: {0}")]
    ProviderDenied(String),

    #[error("Callback is missing the authorization code")]
    MissingCode,

    #[error("Unknown or expired login state")]
    UnknownState,

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
