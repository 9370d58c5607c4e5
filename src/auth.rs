//! Google Cloud service-account authentication.
//!
//! A signed JWT is exchanged at the account's `token_uri` for an OAuth2 access
//! token. Tokens are cached and refreshed shortly before they expire.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as stale.
const REFRESH_MARGIN_MINUTES: i64 = 5;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OAuth token exchange failed (HTTP {status}): {body}")]
    Exchange { status: u16, body: String },
}

/// The parts of a service-account key file this service needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize, PartialEq)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl JwtClaims {
    fn new(credentials: &ServiceAccountCredentials, now: DateTime<Utc>) -> Self {
        Self {
            iss: credentials.client_email.clone(),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            aud: credentials.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::minutes(REFRESH_MARGIN_MINUTES)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Anything that can hand out a bearer token for Google APIs.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

pub struct ServiceAccountTokenSource {
    http: Client,
    credentials: ServiceAccountCredentials,
    cache: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(http: Client, credentials: ServiceAccountCredentials) -> Self {
        Self {
            http,
            credentials,
            cache: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, AuthError> {
        tracing::info!(
            "requesting access token for service account {}",
            self.credentials.client_email
        );

        let claims = JwtClaims::new(&self.credentials, Utc::now());
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("token exchange failed ({}): {}", status, body);
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("access token expires in {} seconds", token.expires_in);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *self.cache.write().await = Some(token);
        Ok(access_token)
    }
}
