use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{env_var, ConfigError, CLIENT_ID_VAR, CLIENT_SECRET_VAR};

/// Tokens are renewed this long before the catalog would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match (lookup(CLIENT_ID_VAR), lookup(CLIENT_SECRET_VAR)) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Ok(ClientCredentials::new(client_id, client_secret))
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Access {
    access_token: String,
    expires_in: u64,
    #[serde(skip, default = "Instant::now")]
    received_at: Instant,
}

impl Access {
    pub fn is_expired(&self) -> bool {
        self.received_at.elapsed() + EXPIRY_MARGIN >= Duration::from_secs(self.expires_in)
    }

    pub fn authorize(&self, request_builder: RequestBuilder) -> RequestBuilder {
        request_builder.bearer_auth(self.access_token.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Token request rejected ({status}): {reason}")]
    Rejected { status: u16, reason: String },
}

/// Runs the client-credentials grant against `token_url`. The returned token
/// only grants access to public catalog data, which is all the handlers read.
pub async fn request_access_token(
    client: &Client,
    token_url: &str,
    credentials: &ClientCredentials,
) -> Result<Access, AuthorizeError> {
    let request = client
        .post(token_url)
        .form(&[("grant_type", "client_credentials")])
        .basic_auth(
            credentials.client_id.as_str(),
            Some(credentials.client_secret.as_str()),
        )
        .build()?;
    let resp = client.execute(request).await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<Access>().await?);
    }
    let reason = match resp.json::<TokenErrorBody>().await {
        Ok(body) => body.error_description.unwrap_or(body.error),
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(AuthorizeError::Rejected {
        status: status.as_u16(),
        reason,
    })
}
