use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::service::{MagentoConfig, Secret};
use crate::errors::{CredentialError, CredentialResult};

#[derive(Serialize)]
struct IssueRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Username/password pair exchanged for an admin bearer token.
#[derive(Debug, Clone)]
pub struct IssuerCredentials {
    pub username: String,
    pub password: Secret,
}

/// Remote token issuer: `POST {username, password}` -> `"<token>"`.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    client: Client,
    token_url: String,
    credentials: IssuerCredentials,
}

impl TokenIssuer {
    pub fn new(client: Client, token_url: impl Into<String>, credentials: IssuerCredentials) -> Self {
        Self { client, token_url: token_url.into(), credentials }
    }

    pub fn from_config(client: Client, config: &MagentoConfig) -> Self {
        Self::new(
            client,
            config.token_url.to_owned(),
            IssuerCredentials {
                username: config.username.to_owned(),
                password: config.password.clone(),
            },
        )
    }

    /// Exchange the configured credentials for a fresh token.
    pub async fn request_token(&self) -> CredentialResult<String> {
        let payload = IssueRequest {
            username: &self.credentials.username,
            password: self.credentials.password.expose(),
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                error!("token issuer unreachable: {}", err);
                CredentialError::Issuance {
                    status: err.status(),
                    body: None,
                    message: err.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| CredentialError::Issuance {
            status: Some(status),
            body: None,
            message: format!("failed to read issuer response: {}", err),
        })?;

        if status != http::StatusCode::OK {
            error!("token issuer responded with {}: {}", status, body);
            return Err(CredentialError::Issuance {
                status: Some(status),
                message: format!("token request failed with status: {}", status),
                body: Some(body),
            });
        }

        let token = clean_token(&body);
        if token.is_empty() {
            return Err(CredentialError::Issuance {
                status: Some(status),
                body: Some(body),
                message: "token issuer returned an empty token".to_owned(),
            });
        }
        debug!("token issuer returned a token of {} chars", token.len());
        Ok(token)
    }
}

/// Canonical token text from the issuer body: a JSON string is decoded,
/// anything else is trimmed and stripped of wrapping quotes.
pub fn clean_token(body: &str) -> String {
    let body = body.trim();
    if let Ok(decoded) = serde_json::from_str::<String>(body) {
        return decoded.trim().to_owned();
    }
    body.trim_matches('"').trim().to_owned()
}
