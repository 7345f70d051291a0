//! Salesforce login handshake (OAuth 2.0 username-password flow).
//!
//! A thin collaborator that trades credentials for a session token and
//! instance URL before an export starts. The library never refreshes the
//! token; an expired session surfaces as an HTTP error on the next API call.

use crate::client::RestClient;
use crate::error::{AuthError, Result};
use serde::Deserialize;

/// Token endpoint for production orgs.
const PRODUCTION_LOGIN_HOST: &str = "https://login.salesforce.com";

/// Token endpoint for sandbox orgs.
const SANDBOX_LOGIN_HOST: &str = "https://test.salesforce.com";

/// Credentials for the username-password token flow.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Salesforce username
    pub username: String,
    /// Account password
    pub password: String,
    /// Security token appended to the password for API logins
    pub security_token: String,
    /// Connected-app consumer key
    pub client_id: String,
    /// Connected-app consumer secret
    pub client_secret: String,
    /// Log in against the sandbox host instead of production
    pub sandbox: bool,
}

/// An authenticated session: the bearer token plus the org's instance URL.
#[derive(Clone, Debug)]
pub struct Session {
    /// Bearer token for API calls
    pub access_token: String,
    /// Base URL of the org instance all API paths resolve against
    pub instance_url: String,
}

/// Shape of a successful token-endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

impl Session {
    /// Perform the username-password token flow and return a session.
    pub async fn login(credentials: &Credentials) -> Result<Self> {
        let host = if credentials.sandbox {
            SANDBOX_LOGIN_HOST
        } else {
            PRODUCTION_LOGIN_HOST
        };
        Self::login_at(host, credentials).await
    }

    /// Build a [`RestClient`] bound to this session.
    pub fn client(&self) -> Result<RestClient> {
        RestClient::new(&self.instance_url, &self.access_token)
    }

    async fn login_at(host: &str, credentials: &Credentials) -> Result<Self> {
        // Salesforce expects the security token concatenated onto the password
        let password = format!("{}{}", credentials.password, credentials.security_token);
        let params = [
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", credentials.username.as_str()),
            ("password", password.as_str()),
        ];

        let response = reqwest::Client::new()
            .post(format!("{host}/services/oauth2/token"))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse { reason: e.to_string() })?;

        tracing::info!(instance = %token.instance_url, user = %credentials.username, "Logged in");
        Ok(Self {
            access_token: token.access_token,
            instance_url: token.instance_url,
        })
    }
}
