//! `reqwest` implementation of the identity gateway.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sweet_shop_core::{Credentials, Registration, Role, SessionIdentity};
use tracing::instrument;

use super::{ApiClient, IdentityGateway};
use crate::error::ApiError;

/// Request body for `POST /auth/login`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Request body for `POST /auth/register`.
#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Response from both identity endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Role,
    /// Token lifetime in milliseconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

impl From<AuthResponse> for SessionIdentity {
    fn from(response: AuthResponse) -> Self {
        Self {
            username: response.username,
            email: response.email,
            role: response.role,
            token: SecretString::from(response.token),
            expires_in_ms: response.expires_in,
        }
    }
}

/// Identity gateway over HTTP. Identity calls are never authenticated.
#[derive(Debug, Clone)]
pub struct HttpIdentityGateway {
    api: ApiClient,
}

impl HttpIdentityGateway {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl IdentityGateway for HttpIdentityGateway {
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<SessionIdentity, ApiError> {
        let request = self
            .api
            .request(Method::POST, "/auth/register", None)
            .json(&RegisterRequest {
                username: &registration.username,
                email: &registration.email,
                password: registration.password.expose_secret(),
            });

        let response: AuthResponse = self.api.send_json(request).await?;
        Ok(response.into())
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<SessionIdentity, ApiError> {
        let request = self
            .api
            .request(Method::POST, "/auth/login", None)
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            });

        let response: AuthResponse = self.api.send_json(request).await?;
        Ok(response.into())
    }
}
