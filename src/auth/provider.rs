use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::AuthError;
use crate::config::OAuthConfig;

/// The scope requested from the identity provider
pub const PROFILE_SCOPE: &str = "profile";

/// What the application keeps of the provider's user profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: String,
    pub display_name: String,
}

/// Three-legged OAuth identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent screen URL carrying the one-shot `state`
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
}

/// Google's authorization-code flow
pub struct GoogleProvider {
    client: reqwest::Client,
    authorize_endpoint: Url,
    config: OAuthConfig,
}

impl GoogleProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        let authorize_endpoint = Url::parse(&config.authorize_url)
            .map_err(|e| AuthError::InvalidConfig(format!("authorize_url: {}", e)))?;
        Url::parse(&config.callback_url)
            .map_err(|e| AuthError::InvalidConfig(format!("callback_url: {}", e)))?;

        if config.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set; Google login will fail");
        }

        Ok(Self {
            client: reqwest::Client::new(),
            authorize_endpoint,
            config,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", PROFILE_SCOPE)
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        let token: TokenResponse = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuthError::Exchange(e.to_string()))?
            .json()
            .await?;

        let info: UserInfo = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuthError::Exchange(e.to_string()))?
            .json()
            .await?;

        Ok(ProviderProfile {
            display_name: info.name.unwrap_or_else(|| info.sub.clone()),
            id: info.sub,
        })
    }
}
