//! Authorization code flow against the calendar provider.

use serde::Deserialize;
use url::Url;

use crate::error::Error;

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

/// OAuth client credentials issued by the provider's developer console.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    credentials: Credentials,
    redirect_uri: String,
    authorize_endpoint: Url,
    token_endpoint: Url,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        redirect_uri: String,
        authorize_endpoint: Url,
        token_endpoint: Url,
    ) -> Self {
        Self {
            http,
            credentials,
            redirect_uri,
            authorize_endpoint,
            token_endpoint,
        }
    }

    /// Consent page URL the user is redirected to. `state` comes back
    /// untouched on the callback.
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("state", state);
        url
    }

    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, Error> {
        log::debug!("Exchanging authorization code at {}", self.token_endpoint);

        let response = self
            .http
            .post(self.token_endpoint.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| Error::TokenExchange(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenExchange(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|err| Error::TokenExchange(err.to_string()))
    }
}
